use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single message crossing the wire between two endpoints.
///
/// `mtype` values are part of the wire contract and must never be renumbered:
/// `Call = 1`, `RespData = 2`, `RespErr = 3`, `Custom = 4`, `Ready = 5`. Field
/// names are likewise wire-stable; new fields may only be added as optional.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Envelope {
    /// A request to invoke a method on a registered interface.
    ///
    /// `req_id` absent means fire-and-forget, which the responder currently
    /// treats as a protocol error (`RPC_MISSING_REQID`).
    Call {
        req_id: Option<u64>,
        iface: String,
        meth: String,
        args: Value,
        fwd_dest: Option<String>,
    },
    /// A successful response to a previously issued `Call`.
    RespData { req_id: u64, data: Option<Value> },
    /// A failed response to a previously issued `Call`.
    RespErr {
        req_id: u64,
        mesg: String,
        code: Option<String>,
    },
    /// An out-of-band message carrying no request id.
    Custom {
        data: Value,
        fwd_dest: Option<String>,
    },
    /// Handshake signaling that the sender is ready to receive messages.
    Ready,
}

impl Envelope {
    /// The wire `mtype` discriminant for this envelope.
    pub fn mtype(&self) -> u8 {
        match self {
            Envelope::Call { .. } => 1,
            Envelope::RespData { .. } => 2,
            Envelope::RespErr { .. } => 3,
            Envelope::Custom { .. } => 4,
            Envelope::Ready => 5,
        }
    }

    /// The `fwdDest` routing hint, if this envelope carries one.
    pub fn fwd_dest(&self) -> Option<&str> {
        match self {
            Envelope::Call { fwd_dest, .. } | Envelope::Custom { fwd_dest, .. } => {
                fwd_dest.as_deref()
            }
            _ => None,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("mtype", &self.mtype())?;
        match self {
            Envelope::Call {
                req_id,
                iface,
                meth,
                args,
                fwd_dest,
            } => {
                if let Some(req_id) = req_id {
                    map.serialize_entry("reqId", req_id)?;
                }
                map.serialize_entry("iface", iface)?;
                map.serialize_entry("meth", meth)?;
                map.serialize_entry("args", args)?;
                if let Some(fwd_dest) = fwd_dest {
                    map.serialize_entry("fwdDest", fwd_dest)?;
                }
            }
            Envelope::RespData { req_id, data } => {
                map.serialize_entry("reqId", req_id)?;
                if let Some(data) = data {
                    map.serialize_entry("data", data)?;
                }
            }
            Envelope::RespErr { req_id, mesg, code } => {
                map.serialize_entry("reqId", req_id)?;
                map.serialize_entry("mesg", mesg)?;
                if let Some(code) = code {
                    map.serialize_entry("code", code)?;
                }
            }
            Envelope::Custom { data, fwd_dest } => {
                map.serialize_entry("data", data)?;
                if let Some(fwd_dest) = fwd_dest {
                    map.serialize_entry("fwdDest", fwd_dest)?;
                }
            }
            Envelope::Ready => {}
        }
        map.end()
    }
}

/// Raw shadow of the wire fields, used only to drive deserialization before
/// we dispatch on `mtype` and build the typed [`Envelope`] variant.
#[derive(Deserialize)]
struct RawEnvelope {
    mtype: u8,
    #[serde(rename = "reqId")]
    req_id: Option<u64>,
    iface: Option<String>,
    meth: Option<String>,
    args: Option<Value>,
    #[serde(rename = "fwdDest")]
    fwd_dest: Option<String>,
    data: Option<Value>,
    mesg: Option<String>,
    code: Option<String>,
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        let missing = |field: &'static str| de::Error::missing_field(field);
        Ok(match raw.mtype {
            1 => Envelope::Call {
                req_id: raw.req_id,
                iface: raw.iface.ok_or_else(|| missing("iface"))?,
                meth: raw.meth.ok_or_else(|| missing("meth"))?,
                args: raw.args.unwrap_or(Value::Array(Vec::new())),
                fwd_dest: raw.fwd_dest,
            },
            2 => Envelope::RespData {
                req_id: raw.req_id.ok_or_else(|| missing("reqId"))?,
                data: raw.data,
            },
            3 => Envelope::RespErr {
                req_id: raw.req_id.ok_or_else(|| missing("reqId"))?,
                mesg: raw.mesg.ok_or_else(|| missing("mesg"))?,
                code: raw.code,
            },
            4 => Envelope::Custom {
                data: raw.data.unwrap_or(Value::Null),
                fwd_dest: raw.fwd_dest,
            },
            5 => Envelope::Ready,
            other => return Err(de::Error::custom(format!("unknown mtype {other}"))),
        })
    }
}

//! Method channel messages between the UI layer and the platform shim

use serde::{Deserialize, Serialize};

use crate::ProtocolResult;

/// Methods the UI layer may invoke on the service channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMethod {
    /// "start sharing"
    StartForegroundService,
    /// "stop sharing"
    StopForegroundService,
}

impl ServiceMethod {
    pub const START: &'static str = "startForegroundService";
    pub const STOP: &'static str = "stopForegroundService";

    /// Resolve a method name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            Self::START => Some(Self::StartForegroundService),
            Self::STOP => Some(Self::StopForegroundService),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartForegroundService => Self::START,
            Self::StopForegroundService => Self::STOP,
        }
    }
}

/// Messages delivered to the shim, one JSON object per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// UI invoked a method on the service channel
    MethodCall {
        id: u64,
        method: String,
    },
    /// The platform answered the permission dialog
    ActivityResult {
        request_code: i32,
        result_code: i32,
        #[serde(default)]
        payload: Option<String>,
    },
    /// The hosting process destroyed the capture service
    ServiceDestroyed,
}

impl InboundMessage {
    pub fn from_json(line: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Result of one method call, as seen by the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    Success,
    Error { code: String, message: String },
    NotImplemented,
}

impl Reply {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Reply envelope written back to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReply {
    pub id: u64,
    #[serde(flatten)]
    pub reply: Reply,
}

impl ChannelReply {
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(
            ServiceMethod::parse("startForegroundService"),
            Some(ServiceMethod::StartForegroundService)
        );
        assert_eq!(
            ServiceMethod::parse("stopForegroundService"),
            Some(ServiceMethod::StopForegroundService)
        );
        assert_eq!(ServiceMethod::parse("pauseForegroundService"), None);
    }

    #[test]
    fn test_inbound_parsing() {
        let call = InboundMessage::from_json(
            r#"{"type":"method_call","id":3,"method":"startForegroundService"}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            InboundMessage::MethodCall {
                id: 3,
                method: "startForegroundService".to_string()
            }
        );

        let result = InboundMessage::from_json(
            r#"{"type":"activity_result","request_code":1001,"result_code":0}"#,
        )
        .unwrap();
        assert_eq!(
            result,
            InboundMessage::ActivityResult {
                request_code: 1001,
                result_code: 0,
                payload: None
            }
        );

        assert!(InboundMessage::from_json("{not json").is_err());
    }

    #[test]
    fn test_reply_wire_format() {
        let reply = ChannelReply {
            id: 7,
            reply: Reply::error("PERMISSION_DENIED", crate::PERMISSION_DENIED_REASON),
        };
        let json: serde_json::Value = serde_json::from_str(&reply.to_json().unwrap()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "PERMISSION_DENIED");
        assert_eq!(json["message"], "User denied screen capture permission");

        let ok = ChannelReply { id: 1, reply: Reply::Success }.to_json().unwrap();
        assert_eq!(ok, r#"{"id":1,"status":"success"}"#);
    }
}

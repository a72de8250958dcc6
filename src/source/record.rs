//! The record type delivered by every source.
//!
//! Stream sources receive records as newline-delimited JSON, one object per
//! line, mirroring the fields of a ROS `/rosout` log message:
//!
//! ```json
//! {"name": "rosbag_checker_live", "msg": "Statistics for topic /odom\nMessage count = 600, Message frequency = 20.0"}
//! ```

use serde::{Deserialize, Serialize};

/// One diagnostic log message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Name of the node or logger that emitted the message, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The message text, possibly containing terminal escape codes.
    pub msg: String,
}

impl LogRecord {
    /// A record with no emitter name.
    pub fn anonymous(msg: impl Into<String>) -> Self {
        Self {
            name: None,
            msg: msg.into(),
        }
    }

    /// A record emitted by `name`.
    pub fn from_node(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            msg: msg.into(),
        }
    }

    /// Returns true if this record should be processed for `target`.
    ///
    /// Records without a name always pass, as does an empty target.
    /// Otherwise the emitter name must contain the target.
    pub fn is_from(&self, target: &str) -> bool {
        match &self.name {
            _ if target.is_empty() => true,
            None => true,
            Some(name) => name.contains(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_record() {
        let json = r#"{"name": "/rosbag_checker_live", "msg": "Statistics for topic /odom\nMessage count = 1, Message frequency = 2.0"}"#;
        let record: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name.as_deref(), Some("/rosbag_checker_live"));
        assert!(record.msg.contains('\n'));
    }

    #[test]
    fn test_name_is_optional() {
        let record: LogRecord = serde_json::from_str(r#"{"msg": "hello"}"#).unwrap();
        assert_eq!(record, LogRecord::anonymous("hello"));
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"msg":"hello"}"#);
    }

    #[test]
    fn test_target_filter() {
        let record = LogRecord::from_node("/ecu0/rosbag_checker_live", "x");
        assert!(record.is_from("rosbag_checker_live"));
        assert!(record.is_from(""));
        assert!(!record.is_from("other_node"));

        assert!(LogRecord::anonymous("x").is_from("rosbag_checker_live"));
    }
}

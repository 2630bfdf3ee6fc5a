//! Line-oriented rotator control protocol (rotctld subset).
//!
//! Requests are whitespace-separated tokens; `p` queries the position,
//! `P <az> <el>` commands it and `S` ends the session. Replies are either
//! the two angles on separate lines or a `RPRT <code>` status line.

use crate::constants::*;
use crate::error::{Result, RotatorError};
use crate::types::AngleReading;
use std::fmt;

/// Decoded control request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    GetPosition,
    SetPosition { azimuth: f64, elevation: f64 },
    Stop,
}

impl Request {
    /// Decode one request buffer
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(data);
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let Some(&command) = tokens.first() else {
            return Err(RotatorError::MalformedRequest("empty request".to_string()));
        };

        match command {
            CMD_GET_POSITION => Ok(Request::GetPosition),
            CMD_SET_POSITION => {
                if tokens.len() != CMD_SET_POSITION_NUM_PARAMS {
                    return Err(RotatorError::MalformedRequest(format!(
                        "{} expects {} values, got {}",
                        CMD_SET_POSITION,
                        CMD_SET_POSITION_NUM_PARAMS - 1,
                        tokens.len() - 1
                    )));
                }
                Ok(Request::SetPosition {
                    azimuth: parse_angle(tokens[1])?,
                    elevation: parse_angle(tokens[2])?,
                })
            }
            CMD_STOP => Ok(Request::Stop),
            other => Err(RotatorError::UnknownRequest(other.to_string())),
        }
    }
}

fn parse_angle(token: &str) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(angle) if angle.is_finite() => Ok(angle),
        _ => Err(RotatorError::MalformedRequest(format!(
            "invalid angle {:?}",
            token
        ))),
    }
}

/// Reply status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    Success,
    Failure,
}

impl ReplyCode {
    pub fn code(self) -> u8 {
        match self {
            ReplyCode::Success => RESP_SUCCESS,
            ReplyCode::Failure => RESP_FAILURE,
        }
    }
}

/// Reply sent for exactly one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    Position(AngleReading),
    Report(ReplyCode),
}

impl Reply {
    pub fn success() -> Self {
        Reply::Report(ReplyCode::Success)
    }

    pub fn failure() -> Self {
        Reply::Report(ReplyCode::Failure)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Position(reading) => write!(f, "{}\n{}\n", reading.azimuth, reading.elevation),
            Reply::Report(code) => write!(f, "RPRT {}\n", code.code()),
        }
    }
}

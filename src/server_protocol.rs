use serde_json::Value;

use crate::types::{Position, Team};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Hello {
        name: String,
        team: Option<Team>,
        reconnect_token: Option<String>,
    },
    Start,
    Click {
        node: usize,
    },
    AreaTrigger {
        id: u32,
    },
    Position {
        position: Position,
    },
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "hello" => {
            let name = object.get("name")?.as_str()?.to_string();
            let team = match object.get("team") {
                None => None,
                Some(value) => Some(Team::parse(value.as_str()?)?),
            };
            let reconnect_token = match object.get("reconnectToken") {
                None => None,
                Some(value) => Some(value.as_str()?.to_string()),
            };
            Some(ParsedClientMessage::Hello {
                name,
                team,
                reconnect_token,
            })
        }
        "start" => Some(ParsedClientMessage::Start),
        "click" => {
            // Out-of-range indices are passed through; the engine ignores them.
            let node = usize::try_from(object.get("node")?.as_u64()?).ok()?;
            Some(ParsedClientMessage::Click { node })
        }
        "area_trigger" => {
            let id = u32::try_from(object.get("id")?.as_u64()?).ok()?;
            Some(ParsedClientMessage::AreaTrigger { id })
        }
        "position" => {
            let x = parse_coordinate(object.get("x")?)?;
            let y = parse_coordinate(object.get("y")?)?;
            Some(ParsedClientMessage::Position {
                position: Position { x, y },
            })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_coordinate(value: &Value) -> Option<f32> {
    let number = value.as_f64()?;
    if !number.is_finite() || number.abs() > f64::from(f32::MAX) {
        return None;
    }
    Some(number as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hello_message() {
        let parsed = parse_client_message(r#"{"type":"hello","name":"A","team":"horde"}"#)
            .expect("hello message should parse");
        match parsed {
            ParsedClientMessage::Hello {
                name,
                team,
                reconnect_token,
            } => {
                assert_eq!(name, "A");
                assert_eq!(team, Some(Team::Horde));
                assert_eq!(reconnect_token, None);
            }
            _ => panic!("expected hello message"),
        }
    }

    #[test]
    fn parse_hello_rejects_unknown_team() {
        assert!(parse_client_message(r#"{"type":"hello","name":"A","team":"scourge"}"#).is_none());
        assert!(matches!(
            parse_client_message(r#"{"type":"hello","name":"A","reconnectToken":"abc"}"#),
            Some(ParsedClientMessage::Hello {
                team: None,
                reconnect_token: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn parse_click_keeps_out_of_range_index() {
        assert!(matches!(
            parse_client_message(r#"{"type":"click","node":7}"#),
            Some(ParsedClientMessage::Click { node: 7 })
        ));
        assert!(parse_client_message(r#"{"type":"click","node":-1}"#).is_none());
        assert!(parse_client_message(r#"{"type":"click","node":"farm"}"#).is_none());
    }

    #[test]
    fn parse_area_trigger_message() {
        assert!(matches!(
            parse_client_message(r#"{"type":"area_trigger","id":3948}"#),
            Some(ParsedClientMessage::AreaTrigger { id: 3_948 })
        ));
        assert!(parse_client_message(r#"{"type":"area_trigger","id":99999999999}"#).is_none());
    }

    #[test]
    fn parse_position_requires_finite_coordinates() {
        let parsed = parse_client_message(r#"{"type":"position","x":1016.5,"y":955.25}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::Position {
                position: Position { x, y }
            }) if x == 1_016.5 && y == 955.25
        ));
        assert!(parse_client_message(r#"{"type":"position","x":1e300,"y":0}"#).is_none());
        assert!(parse_client_message(r#"{"type":"position","x":1}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Ping { .. })));
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(parse_client_message(r#"{"type":"input","dir":"up"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }
}

use serde::{Deserialize, Serialize};

use crate::models::{Cell, GameParams, Pos};

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    #[serde(rename = "reveal")]
    Reveal { pos: Pos },
    #[serde(rename = "flag")]
    Flag { pos: Pos },
    #[serde(rename = "restart")]
    Restart { params: GameParams },
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CellUpdate {
    pub pos: Pos,
    pub value: Cell,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init {
        rows: usize,
        cols: usize,
        mines: usize,
        remaining: usize,
        field: Vec<Vec<Cell>>,
    },
    #[serde(rename = "update")]
    Update {
        updates: Vec<CellUpdate>,
        remaining: usize,
        won: bool,
        lost: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_actions_parse() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"flag","pos":{"row":2,"col":7}}"#).unwrap();
        assert!(matches!(
            message,
            ClientMessage::Flag {
                pos: Pos { row: 2, col: 7 }
            }
        ));

        let message: ClientMessage =
            serde_json::from_str(r#"{"action":"restart","params":{}}"#).unwrap();
        assert!(matches!(
            message,
            ClientMessage::Restart { params } if params == GameParams::default()
        ));
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"action":"chord"}"#).is_err());
    }

    #[test]
    fn update_carries_outcome_flags() {
        let message = ServerMessage::Update {
            updates: vec![CellUpdate {
                pos: Pos::new(0, 1),
                value: Cell::Flagged,
            }],
            remaining: 9,
            won: false,
            lost: false,
        };
        let value: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "update");
        assert_eq!(value["remaining"], 9);
        assert_eq!(value["updates"][0]["value"]["state"], "flagged");
    }
}

//! Update Relay
//!
//! Pushes dashboard updates to connected clients over WebSocket.
//!
//! ## Topics
//!
//! - `queue`: the queue was replaced (`queue_updated`)
//! - `notifications`: arrival and critical notifications
//! - `vitals.*`: every new vitals sample
//! - `vitals.{id}`: vitals samples for one patient
//!
//! ## Protocol
//!
//! Client → Server:
//! ```json
//! {"type": "subscribe", "topics": ["queue", "vitals.10001"]}
//! {"type": "unsubscribe", "topics": ["vitals.10001"]}
//! {"type": "ping"}
//! ```
//!
//! Server → Client:
//! ```json
//! {"type": "connected", "connection_id": "..."}
//! {"type": "queue_updated", "version": 4, "count": 12}
//! {"type": "notification", "notification": {...}}
//! {"type": "vitals", "patient_id": 10001, "sample": {...}, "label": "14:05:09"}
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{spawn_forwarder, ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent, NOTIFICATIONS_TOPIC, QUEUE_TOPIC};

use crate::endpoint::Endpoint;
use crate::envelope::{Ack, Envelope};
use crate::error::ClientResult;
use crate::models::{RoomInfo, RoomJoin, RoomRef, RoomRequest};
use crate::transport::Transport;

/// 视频通话房间接口；信令本身走 STOMP
#[derive(Clone)]
pub struct VideoCallApi {
    transport: Transport,
}

impl VideoCallApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create a room, or join `room_id` when given
    pub async fn create_room(&self, request: &RoomRequest) -> ClientResult<Envelope<RoomJoin>> {
        self.transport.send_json(Endpoint::CreateRoom, request).await
    }

    pub async fn room(&self, room_id: &str) -> ClientResult<Envelope<RoomInfo>> {
        self.transport
            .get(Endpoint::RoomInfo(room_id.to_string()))
            .await
    }

    pub async fn leave_room(&self, room_id: &str) -> ClientResult<Ack> {
        self.transport
            .send_json(Endpoint::LeaveRoom, &RoomRef { room_id })
            .await
    }
}

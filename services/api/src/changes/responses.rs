use serde::Serialize;

use stechuhr_db::change_request::models::ChangeRequest;

#[derive(Debug, Serialize)]
pub struct ListChangeRequestsResponse {
    pub data: Vec<ChangeRequest>,
    pub count: usize,
}

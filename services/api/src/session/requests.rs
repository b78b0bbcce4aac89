use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPinRequest {
    pub name: String,
    pub pin: String,
}

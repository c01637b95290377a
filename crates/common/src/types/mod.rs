use serde::Serialize;

/// Health probe payload for the `/health` route.
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

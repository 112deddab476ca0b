use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::ZeroizeOnDrop;

#[derive(Clone, Debug, Deserialize, Serialize, ZeroizeOnDrop)]
pub struct InputUser {
    pub username: String,
    pub email: String,
    pub password: String,

    pub city: String,
    pub zip_code: String,
    pub street: String,
    pub house_number: String,
    pub mobile: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ZeroizeOnDrop)]
pub struct InputCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ZeroizeOnDrop)]
pub struct InputNewPassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct InputFriendRequest {
    pub receiver_id: Uuid,
}

/// Body for recording a location. Either both coordinates or a full street
/// address must be present; the handler decides which path to take.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub street: Option<String>,
    pub house_number: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,

    pub location_name: Option<String>,
}

impl InputLocation {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn has_address(&self) -> bool {
        self.street.is_some()
            && self.house_number.is_some()
            && self.city.is_some()
            && self.country.is_some()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InputAddressQuery {
    pub street: String,
    pub house_number: String,
    pub city: String,
    pub country: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct InputCoordinatesQuery {
    pub latitude: f64,
    pub longitude: f64,
}

use serde::Serialize;
use std::time::SystemTime;
use uuid::Uuid;

use crate::geocoding::GeocodingData;
use crate::models::friend_request::{FriendRequest, FriendRequestStatus};
use crate::models::user::User;
use crate::models::user_location::UserLocation;

/// Public view of a user. The password hash never leaves the server.
#[derive(Clone, Debug, Serialize)]
pub struct OutputUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,

    pub city: String,
    pub zip_code: String,
    pub street: String,
    pub house_number: String,
    pub mobile: String,

    pub created_timestamp: SystemTime,
}

impl From<User> for OutputUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            city: user.city,
            zip_code: user.zip_code,
            street: user.street,
            house_number: user.house_number,
            mobile: user.mobile,
            created_timestamp: user.created_timestamp,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputAccessToken {
    pub access_token: String,
    pub server_time: u128,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputFriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: FriendRequestStatus,
    pub request_time: SystemTime,
    pub response_time: Option<SystemTime>,
}

impl From<FriendRequest> for OutputFriendRequest {
    fn from(request: FriendRequest) -> Self {
        Self {
            id: request.id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: request.status,
            request_time: request.request_time,
            response_time: request.response_time,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputLocation {
    pub id: Uuid,
    pub user_id: Uuid,

    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub location_name: Option<String>,

    pub created_timestamp: SystemTime,
}

impl From<UserLocation> for OutputLocation {
    fn from(location: UserLocation) -> Self {
        Self {
            id: location.id,
            user_id: location.user_id,
            latitude: location.latitude,
            longitude: location.longitude,
            formatted_address: location.formatted_address,
            location_name: location.location_name,
            created_timestamp: location.created_timestamp,
        }
    }
}

/// A friend's latest known position, paired with who they are.
#[derive(Clone, Debug, Serialize)]
pub struct OutputFriendLocation {
    pub user_id: Uuid,
    pub username: String,

    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub location_name: Option<String>,

    pub created_timestamp: SystemTime,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputGeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,

    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
}

impl From<GeocodingData> for OutputGeocodeResult {
    fn from(data: GeocodingData) -> Self {
        Self {
            latitude: data.lat,
            longitude: data.lon,
            formatted_address: data.formatted,
            country: data.country,
            city: data.city,
            street: data.street,
            house_number: data.housenumber,
            postal_code: data.postcode,
        }
    }
}

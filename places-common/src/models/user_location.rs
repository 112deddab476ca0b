use diesel::{Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::schema::user_locations;

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable, QueryableByName)]
#[diesel(table_name = user_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserLocation {
    pub id: Uuid,
    pub user_id: Uuid,

    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub location_name: Option<String>,

    pub created_timestamp: SystemTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUserLocation<'a> {
    pub id: Uuid,
    pub user_id: Uuid,

    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: &'a str,
    pub location_name: Option<&'a str>,

    pub created_timestamp: SystemTime,
}

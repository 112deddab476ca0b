use diesel::{dsl, ExpressionMethods, QueryDsl};
use diesel_async::RunQueryDsl;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbAsyncPool};
use crate::models::user_location::{NewUserLocation, UserLocation};

use crate::schema::user_locations as user_location_fields;
use crate::schema::user_locations::dsl::user_locations;

pub struct Dao {
    db_async_pool: DbAsyncPool,
}

impl Dao {
    pub fn new(db_async_pool: &DbAsyncPool) -> Self {
        Self {
            db_async_pool: db_async_pool.clone(),
        }
    }

    /// Appends a location record for a user. Location history is append-only;
    /// nothing here updates or deletes earlier records.
    pub async fn create_location(
        &self,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
        formatted_address: &str,
        location_name: Option<&str>,
    ) -> Result<UserLocation, DaoError> {
        let new_location = NewUserLocation {
            id: Uuid::now_v7(),
            user_id,
            latitude,
            longitude,
            formatted_address,
            location_name,
            created_timestamp: SystemTime::now(),
        };

        let mut conn = self.db_async_pool.get().await?;

        Ok(dsl::insert_into(user_locations)
            .values(&new_location)
            .get_result::<UserLocation>(&mut conn)
            .await?)
    }

    pub async fn get_latest_location(&self, user_id: Uuid) -> Result<UserLocation, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(user_locations
            .filter(user_location_fields::user_id.eq(user_id))
            .order(user_location_fields::created_timestamp.desc())
            .first::<UserLocation>(&mut conn)
            .await?)
    }

    pub async fn get_all_locations(&self, user_id: Uuid) -> Result<Vec<UserLocation>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(user_locations
            .filter(user_location_fields::user_id.eq(user_id))
            .order(user_location_fields::created_timestamp.desc())
            .load::<UserLocation>(&mut conn)
            .await?)
    }

    /// Returns the single most recent location for each of the given users.
    /// Users with no recorded location are simply absent from the result.
    pub async fn get_latest_locations_for_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<Vec<UserLocation>, DaoError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db_async_pool.get().await?;
        Ok(user_locations
            .filter(user_location_fields::user_id.eq_any(user_ids))
            .distinct_on(user_location_fields::user_id)
            .order((
                user_location_fields::user_id.asc(),
                user_location_fields::created_timestamp.desc(),
            ))
            .load::<UserLocation>(&mut conn)
            .await?)
    }
}

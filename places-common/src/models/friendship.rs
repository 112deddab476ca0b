use diesel::{Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::schema::friendships;

/// One directed half of a symmetric friendship. A friendship between two
/// users is always stored as two rows, one in each direction, written and
/// deleted within the same transaction.
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, QueryableByName)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Friendship {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub created_timestamp: SystemTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFriendship {
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub created_timestamp: SystemTime,
}

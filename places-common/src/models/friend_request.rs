use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::SmallInt;
use diesel::{Insertable, Queryable, QueryableByName};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::schema::friend_requests;

/// Status of a friend request. PENDING is the only state from which a
/// transition is allowed; the other three are terminal.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = SmallInt)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Declined,
    Canceled,
}

impl ToSql<SmallInt, Pg> for FriendRequestStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match self {
            FriendRequestStatus::Pending => <i16 as ToSql<SmallInt, Pg>>::to_sql(&0, out),
            FriendRequestStatus::Accepted => <i16 as ToSql<SmallInt, Pg>>::to_sql(&1, out),
            FriendRequestStatus::Declined => <i16 as ToSql<SmallInt, Pg>>::to_sql(&2, out),
            FriendRequestStatus::Canceled => <i16 as ToSql<SmallInt, Pg>>::to_sql(&3, out),
        }
    }
}

impl FromSql<SmallInt, Pg> for FriendRequestStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        match <i16 as FromSql<SmallInt, Pg>>::from_sql(bytes)? {
            0 => Ok(FriendRequestStatus::Pending),
            1 => Ok(FriendRequestStatus::Accepted),
            2 => Ok(FriendRequestStatus::Declined),
            3 => Ok(FriendRequestStatus::Canceled),
            s => Err(format!("Unrecognized friend request status: {s}").into()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Identifiable, Queryable, QueryableByName)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FriendRequest {
    pub id: Uuid,

    pub sender_id: Uuid,
    pub receiver_id: Uuid,

    pub status: FriendRequestStatus,
    pub request_time: SystemTime,
    pub response_time: Option<SystemTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewFriendRequest {
    pub id: Uuid,

    pub sender_id: Uuid,
    pub receiver_id: Uuid,

    pub status: FriendRequestStatus,
    pub request_time: SystemTime,
    pub response_time: Option<SystemTime>,
}

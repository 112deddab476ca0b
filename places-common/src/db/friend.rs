use diesel::{dsl, BoolExpressionMethods, ExpressionMethods, JoinOnDsl, QueryDsl};
use diesel_async::RunQueryDsl;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::{DaoError, DbAsyncPool};
use crate::models::friend_request::{FriendRequest, FriendRequestStatus, NewFriendRequest};
use crate::models::friendship::NewFriendship;
use crate::models::user::User;

use crate::schema::friend_requests as friend_request_fields;
use crate::schema::friend_requests::dsl::friend_requests;
use crate::schema::friendships as friendship_fields;
use crate::schema::friendships::dsl::friendships;
use crate::schema::users as user_fields;
use crate::schema::users::dsl::users;

pub struct Dao {
    db_async_pool: DbAsyncPool,
}

impl Dao {
    pub fn new(db_async_pool: &DbAsyncPool) -> Self {
        Self {
            db_async_pool: db_async_pool.clone(),
        }
    }

    /// Creates a PENDING friend request from `sender_id` to `receiver_id`.
    ///
    /// The existence, friendship, and duplicate-request checks run in a
    /// serializable transaction together with the insert so two concurrent
    /// sends for the same pair cannot both pass the checks; the losing
    /// transaction surfaces as `RequestAlreadyPending`.
    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequest, DaoError> {
        let mut db_connection = self.db_async_pool.get().await?;

        let result = db_connection
            .build_transaction()
            .serializable()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    let receiver_exists = dsl::select(dsl::exists(users.find(receiver_id)))
                        .get_result::<bool>(conn)
                        .await?;

                    if !receiver_exists {
                        return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
                    }

                    let already_friends = dsl::select(dsl::exists(
                        friendships.find((sender_id, receiver_id)),
                    ))
                    .get_result::<bool>(conn)
                    .await?;

                    if already_friends {
                        return Err(DaoError::AlreadyFriends);
                    }

                    // A pending request in either direction blocks a new one
                    let pending_exists = dsl::select(dsl::exists(
                        friend_requests
                            .filter(
                                friend_request_fields::sender_id
                                    .eq(sender_id)
                                    .and(friend_request_fields::receiver_id.eq(receiver_id))
                                    .or(friend_request_fields::sender_id
                                        .eq(receiver_id)
                                        .and(friend_request_fields::receiver_id.eq(sender_id))),
                            )
                            .filter(friend_request_fields::status.eq(FriendRequestStatus::Pending)),
                    ))
                    .get_result::<bool>(conn)
                    .await?;

                    if pending_exists {
                        return Err(DaoError::RequestAlreadyPending);
                    }

                    let new_request = NewFriendRequest {
                        id: Uuid::now_v7(),
                        sender_id,
                        receiver_id,
                        status: FriendRequestStatus::Pending,
                        request_time: SystemTime::now(),
                        response_time: None,
                    };

                    Ok(dsl::insert_into(friend_requests)
                        .values(&new_request)
                        .get_result::<FriendRequest>(conn)
                        .await?)
                })
            })
            .await;

        match result {
            Err(DaoError::QueryFailure(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ))) => Err(DaoError::RequestAlreadyPending),
            other => other,
        }
    }

    /// Accepts a pending request and records the symmetric friendship as two
    /// rows in a single transaction. Only the receiver may accept. The status
    /// update is guarded on the request still being PENDING; if another
    /// transition won the race, no friendship rows are written.
    pub async fn accept_friend_request(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<FriendRequest, DaoError> {
        let mut db_connection = self.db_async_pool.get().await?;

        db_connection
            .build_transaction()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    let request = friend_requests
                        .find(request_id)
                        .first::<FriendRequest>(conn)
                        .await?;

                    if request.receiver_id != acting_user_id {
                        return Err(DaoError::WrongUser);
                    }

                    let now = SystemTime::now();

                    let rows_affected = dsl::update(
                        friend_requests.find(request_id).filter(
                            friend_request_fields::status.eq(FriendRequestStatus::Pending),
                        ),
                    )
                    .set((
                        friend_request_fields::status.eq(FriendRequestStatus::Accepted),
                        friend_request_fields::response_time.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                    if rows_affected == 0 {
                        return Err(DaoError::RequestNotPending);
                    }

                    dsl::insert_into(friendships)
                        .values(&[
                            NewFriendship {
                                user_id: request.sender_id,
                                friend_id: request.receiver_id,
                                created_timestamp: now,
                            },
                            NewFriendship {
                                user_id: request.receiver_id,
                                friend_id: request.sender_id,
                                created_timestamp: now,
                            },
                        ])
                        .execute(conn)
                        .await?;

                    Ok(friend_requests
                        .find(request_id)
                        .first::<FriendRequest>(conn)
                        .await?)
                })
            })
            .await
    }

    /// Declines a pending request. Only the receiver may decline.
    pub async fn decline_friend_request(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<FriendRequest, DaoError> {
        self.close_request(
            request_id,
            acting_user_id,
            ActingParty::Receiver,
            FriendRequestStatus::Declined,
        )
        .await
    }

    /// Cancels a pending request. Only the sender may cancel.
    pub async fn cancel_friend_request(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
    ) -> Result<FriendRequest, DaoError> {
        self.close_request(
            request_id,
            acting_user_id,
            ActingParty::Sender,
            FriendRequestStatus::Canceled,
        )
        .await
    }

    async fn close_request(
        &self,
        request_id: Uuid,
        acting_user_id: Uuid,
        acting_party: ActingParty,
        new_status: FriendRequestStatus,
    ) -> Result<FriendRequest, DaoError> {
        let mut db_connection = self.db_async_pool.get().await?;

        db_connection
            .build_transaction()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    let request = friend_requests
                        .find(request_id)
                        .first::<FriendRequest>(conn)
                        .await?;

                    let owner_id = match acting_party {
                        ActingParty::Sender => request.sender_id,
                        ActingParty::Receiver => request.receiver_id,
                    };

                    if owner_id != acting_user_id {
                        return Err(DaoError::WrongUser);
                    }

                    let rows_affected = dsl::update(
                        friend_requests.find(request_id).filter(
                            friend_request_fields::status.eq(FriendRequestStatus::Pending),
                        ),
                    )
                    .set((
                        friend_request_fields::status.eq(new_status),
                        friend_request_fields::response_time.eq(SystemTime::now()),
                    ))
                    .execute(conn)
                    .await?;

                    if rows_affected == 0 {
                        return Err(DaoError::RequestNotPending);
                    }

                    Ok(friend_requests
                        .find(request_id)
                        .first::<FriendRequest>(conn)
                        .await?)
                })
            })
            .await
    }

    pub async fn get_sent_pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequest>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(friend_requests
            .filter(friend_request_fields::sender_id.eq(user_id))
            .filter(friend_request_fields::status.eq(FriendRequestStatus::Pending))
            .order(friend_request_fields::request_time.desc())
            .load::<FriendRequest>(&mut conn)
            .await?)
    }

    pub async fn get_received_pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequest>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(friend_requests
            .filter(friend_request_fields::receiver_id.eq(user_id))
            .filter(friend_request_fields::status.eq(FriendRequestStatus::Pending))
            .order(friend_request_fields::request_time.desc())
            .load::<FriendRequest>(&mut conn)
            .await?)
    }

    pub async fn get_friends(&self, user_id: Uuid) -> Result<Vec<User>, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(friendships
            .inner_join(users.on(user_fields::id.eq(friendship_fields::friend_id)))
            .filter(friendship_fields::user_id.eq(user_id))
            .select(user_fields::all_columns)
            .order(user_fields::username.asc())
            .load::<User>(&mut conn)
            .await?)
    }

    pub async fn are_friends(&self, user_id: Uuid, other_user_id: Uuid) -> Result<bool, DaoError> {
        let mut conn = self.db_async_pool.get().await?;
        Ok(
            dsl::select(dsl::exists(friendships.find((user_id, other_user_id))))
                .get_result::<bool>(&mut conn)
                .await?,
        )
    }

    /// Removes a friendship, deleting both directed rows in one transaction.
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<(), DaoError> {
        let mut db_connection = self.db_async_pool.get().await?;

        db_connection
            .build_transaction()
            .run::<_, DaoError, _>(|conn| {
                Box::pin(async move {
                    let friend_exists = dsl::select(dsl::exists(users.find(friend_id)))
                        .get_result::<bool>(conn)
                        .await?;

                    if !friend_exists {
                        return Err(DaoError::QueryFailure(diesel::result::Error::NotFound));
                    }

                    let rows_affected = dsl::delete(
                        friendships.filter(
                            friendship_fields::user_id
                                .eq(user_id)
                                .and(friendship_fields::friend_id.eq(friend_id))
                                .or(friendship_fields::user_id
                                    .eq(friend_id)
                                    .and(friendship_fields::friend_id.eq(user_id))),
                        ),
                    )
                    .execute(conn)
                    .await?;

                    if rows_affected == 0 {
                        return Err(DaoError::NotFriends);
                    }

                    Ok(())
                })
            })
            .await
    }
}

enum ActingParty {
    Sender,
    Receiver,
}

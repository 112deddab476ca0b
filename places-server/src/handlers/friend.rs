use places_common::db::{self, DaoError, DbAsyncPool};
use places_common::request_io::{InputFriendRequest, OutputFriendRequest, OutputUser};

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn send_request(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    request_data: web::Json<InputFriendRequest>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let sender_id = auth_token.claims.user_id;
    let receiver_id = request_data.receiver_id;

    if sender_id == receiver_id {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "Cannot send a friend request to yourself",
        )));
    }

    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let request = match friend_dao.send_friend_request(sender_id, receiver_id).await {
        Ok(r) => r,
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "User not found",
            )));
        }
        Err(DaoError::AlreadyFriends) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "Users are already friends",
            )));
        }
        Err(DaoError::RequestAlreadyPending) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "A pending friend request already exists between these users",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to send friend request",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputFriendRequest::from(request)))
}

pub async fn accept_request(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    request_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let request = friend_dao
        .accept_friend_request(*request_id, auth_token.claims.user_id)
        .await
        .map_err(request_transition_error)?;

    Ok(HttpResponse::Ok().json(OutputFriendRequest::from(request)))
}

pub async fn decline_request(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    request_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let request = friend_dao
        .decline_friend_request(*request_id, auth_token.claims.user_id)
        .await
        .map_err(request_transition_error)?;

    Ok(HttpResponse::Ok().json(OutputFriendRequest::from(request)))
}

pub async fn cancel_request(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    request_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let request = friend_dao
        .cancel_friend_request(*request_id, auth_token.claims.user_id)
        .await
        .map_err(request_transition_error)?;

    Ok(HttpResponse::Ok().json(OutputFriendRequest::from(request)))
}

pub async fn get_sent_requests(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let requests = match friend_dao
        .get_sent_pending_requests(auth_token.claims.user_id)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list sent friend requests",
            )));
        }
    };

    let requests: Vec<OutputFriendRequest> =
        requests.into_iter().map(OutputFriendRequest::from).collect();

    Ok(HttpResponse::Ok().json(requests))
}

pub async fn get_received_requests(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let requests = match friend_dao
        .get_received_pending_requests(auth_token.claims.user_id)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list received friend requests",
            )));
        }
    };

    let requests: Vec<OutputFriendRequest> =
        requests.into_iter().map(OutputFriendRequest::from).collect();

    Ok(HttpResponse::Ok().json(requests))
}

pub async fn get_friends(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    let friends = match friend_dao.get_friends(auth_token.claims.user_id).await {
        Ok(f) => f,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list friends",
            )));
        }
    };

    let friends: Vec<OutputUser> = friends.into_iter().map(OutputUser::from).collect();

    Ok(HttpResponse::Ok().json(friends))
}

pub async fn remove_friend(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    friend_id: web::Path<Uuid>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let friend_dao = db::friend::Dao::new(&db_async_pool);
    match friend_dao
        .remove_friend(auth_token.claims.user_id, *friend_id)
        .await
    {
        Ok(()) => (),
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "User not found",
            )));
        }
        Err(DaoError::NotFriends) => {
            return Err(HttpErrorResponse::ConflictWithExisting(String::from(
                "Users are not friends",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to remove friend",
            )));
        }
    }

    Ok(HttpResponse::Ok().finish())
}

fn request_transition_error(error: DaoError) -> HttpErrorResponse {
    match error {
        DaoError::QueryFailure(diesel::result::Error::NotFound) => {
            HttpErrorResponse::DoesNotExist(String::from("Friend request not found"))
        }
        DaoError::WrongUser => HttpErrorResponse::UserDisallowed(String::from(
            "Friend request does not belong to this user",
        )),
        DaoError::RequestNotPending => HttpErrorResponse::ConflictWithExisting(String::from(
            "Friend request is no longer pending",
        )),
        e => {
            log::error!("{e}");
            HttpErrorResponse::InternalError(String::from("Failed to update friend request"))
        }
    }
}

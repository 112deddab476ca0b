use places_common::db::{self, DaoError, DbAsyncPool};
use places_common::request_io::{InputNewPassword, OutputUser};

use actix_web::{web, HttpResponse};
use zeroize::Zeroizing;

use crate::handlers::auth::{hash_password, verify_password};
use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn change_password(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
    password_data: web::Json<InputNewPassword>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let password_data = password_data.into_inner();

    if password_data.new_password.len() < 8 {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "New password must be at least 8 characters",
        )));
    }

    let user_dao = db::user::Dao::new(&db_async_pool);
    let user = match user_dao.get_user_by_id(auth_token.claims.user_id).await {
        Ok(u) => u,
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "User not found",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up user",
            )));
        }
    };

    let current_password = Zeroizing::new(password_data.current_password.clone());
    let password_matches = verify_password(current_password, user.password_hash.clone()).await?;

    if !password_matches {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            "Current password was incorrect",
        )));
    }

    let new_password_hash =
        hash_password(Zeroizing::new(password_data.new_password.clone())).await?;

    if let Err(e) = user_dao
        .update_password(user.id, &new_password_hash)
        .await
    {
        log::error!("{e}");
        return Err(HttpErrorResponse::InternalError(String::from(
            "Failed to update password",
        )));
    }

    Ok(HttpResponse::Ok().finish())
}

pub async fn get_all_users(
    db_async_pool: web::Data<DbAsyncPool>,
    _auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_dao = db::user::Dao::new(&db_async_pool);
    let users = match user_dao.get_all_users().await {
        Ok(u) => u,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to list users",
            )));
        }
    };

    let users: Vec<OutputUser> = users.into_iter().map(OutputUser::from).collect();

    Ok(HttpResponse::Ok().json(users))
}

use places_common::db::{self, DaoError, DbAsyncPool};
use places_common::request_io::{InputCredentials, InputUser, OutputAccessToken, OutputUser};
use places_common::token::auth_token::{AuthToken, AuthTokenType, NewAuthTokenClaims};
use places_common::validators::{self, Validity};

use actix_web::{web, HttpResponse};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::oneshot;
use zeroize::Zeroizing;

use crate::env;
use crate::handlers::error::HttpErrorResponse;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 512;

pub async fn register(
    db_async_pool: web::Data<DbAsyncPool>,
    user_data: web::Json<InputUser>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let user_data = user_data.into_inner();

    if let Validity::Invalid(msg) = validators::validate_email_address(&user_data.email) {
        return Err(HttpErrorResponse::IncorrectlyFormed(msg));
    }

    if user_data.username.is_empty() || user_data.username.len() > 255 {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "Username must be between 1 and 255 characters",
        )));
    }

    if user_data.password.len() < MIN_PASSWORD_LENGTH {
        return Err(HttpErrorResponse::IncorrectlyFormed(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters",
        )));
    }

    if user_data.password.len() > MAX_PASSWORD_LENGTH {
        return Err(HttpErrorResponse::IncorrectlyFormed(format!(
            "Password is too long. Max: {MAX_PASSWORD_LENGTH} bytes",
        )));
    }

    let password_hash = hash_password(Zeroizing::new(user_data.password.clone())).await?;

    let user_dao = db::user::Dao::new(&db_async_pool);
    let user = match user_dao
        .create_user(
            &user_data.username,
            &user_data.email,
            &password_hash,
            &user_data.city,
            &user_data.zip_code,
            &user_data.street,
            &user_data.house_number,
            &user_data.mobile,
        )
        .await
    {
        Ok(u) => u,
        Err(DaoError::AlreadyExists(field)) => {
            return Err(HttpErrorResponse::ConflictWithExisting(format!(
                "A user with the given {field} already exists",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to create user",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputUser::from(user)))
}

pub async fn login(
    db_async_pool: web::Data<DbAsyncPool>,
    credentials: web::Json<InputCredentials>,
) -> Result<HttpResponse, HttpErrorResponse> {
    const INCORRECT_CREDENTIALS_MSG: &str = "Incorrect email address or password";

    let credentials = credentials.into_inner();

    if let Validity::Invalid(msg) = validators::validate_email_address(&credentials.email) {
        return Err(HttpErrorResponse::IncorrectlyFormed(msg));
    }

    if credentials.password.len() > MAX_PASSWORD_LENGTH {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            INCORRECT_CREDENTIALS_MSG,
        )));
    }

    let user_dao = db::user::Dao::new(&db_async_pool);
    let user = match user_dao.get_user_by_email(&credentials.email).await {
        Ok(u) => u,
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            // Same response as a wrong password to prevent user enumeration
            return Err(HttpErrorResponse::IncorrectCredential(String::from(
                INCORRECT_CREDENTIALS_MSG,
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to look up user",
            )));
        }
    };

    let password = Zeroizing::new(credentials.password.clone());
    let password_matches = verify_password(password, user.password_hash.clone()).await?;

    if !password_matches {
        return Err(HttpErrorResponse::IncorrectCredential(String::from(
            INCORRECT_CREDENTIALS_MSG,
        )));
    }

    let now = SystemTime::now();

    let claims = NewAuthTokenClaims {
        user_id: user.id,
        user_email: &user.email,
        expiration: (now + env::CONF.access_token_lifetime)
            .duration_since(UNIX_EPOCH)
            .expect("Failed to fetch system time")
            .as_secs(),
        token_type: AuthTokenType::Access,
    };

    let access_token = AuthToken::sign_new(claims, &env::CONF.token_signing_key);

    Ok(HttpResponse::Ok().json(OutputAccessToken {
        access_token,
        server_time: now
            .duration_since(UNIX_EPOCH)
            .expect("Failed to fetch system time")
            .as_millis(),
    }))
}

pub(crate) async fn hash_password(
    password: Zeroizing<String>,
) -> Result<String, HttpErrorResponse> {
    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let hash_result = argon2_kdf::Hasher::default()
            .algorithm(argon2_kdf::Algorithm::Argon2id)
            .salt_length(env::CONF.hash_salt_length)
            .hash_length(env::CONF.hash_length)
            .iterations(env::CONF.hash_iterations)
            .memory_cost_kib(env::CONF.hash_mem_cost_kib)
            .threads(env::CONF.hash_threads)
            .secret(argon2_kdf::Secret::using(&env::CONF.hashing_key))
            .hash(password.as_bytes());

        let hash = match hash_result {
            Ok(h) => h,
            Err(e) => {
                sender.send(Err(e)).expect("Sending to channel failed");
                return;
            }
        };

        sender
            .send(Ok(hash.to_string()))
            .expect("Sending to channel failed");
    });

    match receiver.await? {
        Ok(h) => Ok(h),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to hash password",
            )))
        }
    }
}

pub(crate) async fn verify_password(
    password: Zeroizing<String>,
    password_hash: String,
) -> Result<bool, HttpErrorResponse> {
    let (sender, receiver) = oneshot::channel();

    rayon::spawn(move || {
        let hash = match argon2_kdf::Hash::from_str(&password_hash) {
            Ok(h) => h,
            Err(e) => {
                sender.send(Err(e)).expect("Sending to channel failed");
                return;
            }
        };

        let matches = hash.verify_with_secret(
            password.as_bytes(),
            argon2_kdf::Secret::using(&env::CONF.hashing_key),
        );

        sender.send(Ok(matches)).expect("Sending to channel failed");
    });

    match receiver.await? {
        Ok(matches) => Ok(matches),
        Err(e) => {
            log::error!("{e}");
            Err(HttpErrorResponse::InternalError(String::from(
                "Failed to verify password",
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;
    use places_common::request_io::InputFriendRequest;
    use uuid::Uuid;

    use crate::handlers::test_utils;

    #[actix_web::test]
    async fn test_register_creates_user() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let new_user = test_utils::test_input_user();

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&new_user)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp_body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(resp_body["username"], new_user.username.as_str());
        assert_eq!(resp_body["email"], new_user.email.as_str());
        assert!(resp_body.get("password_hash").is_none());
        assert!(resp_body.get("password").is_none());

        let user_dao = db::user::Dao::new(&env::testing::DB_ASYNC_POOL);
        let user = user_dao.get_user_by_email(&new_user.email).await.unwrap();

        // The stored hash must not be the plaintext password
        assert_ne!(user.password_hash, new_user.password);

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicate_username() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, _) = test_utils::create_user().await;

        let mut duplicate = test_utils::test_input_user();
        duplicate.username = user.username.clone();

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&duplicate)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_register_rejects_bad_input() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let mut bad_email = test_utils::test_input_user();
        bad_email.email = String::from("not-an-email");

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&bad_email)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let mut short_password = test_utils::test_input_user();
        short_password.password = String::from("short");

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&short_password)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_login_returns_usable_access_token() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let new_user = test_utils::test_input_user();

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&new_user)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = TestRequest::post()
            .uri("/api/auth/login")
            .set_json(InputCredentials {
                email: new_user.email.clone(),
                password: new_user.password.clone(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);

        let resp_body: serde_json::Value = test::read_body_json(resp).await;
        let access_token = resp_body["access_token"].as_str().unwrap().to_owned();

        // Token must be accepted by an authenticated route
        let req = TestRequest::post()
            .uri("/api/friends/request")
            .insert_header(("AccessToken", access_token))
            .set_json(InputFriendRequest {
                receiver_id: Uuid::now_v7(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        // 404 because the receiver doesn't exist, not 401
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let user_dao = db::user::Dao::new(&env::testing::DB_ASYNC_POOL);
        let user = user_dao.get_user_by_email(&new_user.email).await.unwrap();
        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_login_rejects_wrong_password_and_unknown_email() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let new_user = test_utils::test_input_user();

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&new_user)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = TestRequest::post()
            .uri("/api/auth/login")
            .set_json(InputCredentials {
                email: new_user.email.clone(),
                password: String::from("wrong-password-entirely"),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::post()
            .uri("/api/auth/login")
            .set_json(InputCredentials {
                email: String::from("nobody-here@places.test"),
                password: String::from("does-not-matter-at-all"),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let user_dao = db::user::Dao::new(&env::testing::DB_ASYNC_POOL);
        let user = user_dao.get_user_by_email(&new_user.email).await.unwrap();
        test_utils::delete_user(user.id).await;
    }
}

pub mod auth;
pub mod friend;
pub mod geocode;
pub mod health;
pub mod location;
pub mod user;

pub mod error {
    use actix_web::http::{header, StatusCode};
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use serde::Serialize;
    use std::fmt;
    use tokio::sync::oneshot;

    use places_common::token::TokenError;

    #[derive(Clone, Debug, Serialize)]
    pub struct ServerErrorResponse {
        pub err_type: &'static str,
        pub err_message: String,
    }

    #[derive(Debug)]
    pub enum HttpErrorResponse {
        // 400
        IncorrectlyFormed(String),

        // 401
        IncorrectCredential(String),
        TokenExpired(String),
        TokenMissing(String),
        WrongTokenType(String),

        // 403
        UserDisallowed(String),

        // 404
        DoesNotExist(String),

        // 409
        ConflictWithExisting(String),

        // 500
        InternalError(String),
    }

    impl std::error::Error for HttpErrorResponse {}

    impl fmt::Display for HttpErrorResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let server_error: ServerErrorResponse = self.into();
            write!(f, "{:?}", server_error)
        }
    }

    impl From<&HttpErrorResponse> for ServerErrorResponse {
        fn from(resp: &HttpErrorResponse) -> Self {
            match resp {
                HttpErrorResponse::IncorrectlyFormed(msg) => ServerErrorResponse {
                    err_type: "INCORRECTLY_FORMED",
                    err_message: format!("Incorrectly formed request: {msg}"),
                },
                HttpErrorResponse::IncorrectCredential(msg) => ServerErrorResponse {
                    err_type: "INCORRECT_CREDENTIAL",
                    err_message: format!("Incorrect credential: {msg}"),
                },
                HttpErrorResponse::TokenExpired(msg) => ServerErrorResponse {
                    err_type: "TOKEN_EXPIRED",
                    err_message: format!("Token expired: {msg}"),
                },
                HttpErrorResponse::TokenMissing(msg) => ServerErrorResponse {
                    err_type: "TOKEN_MISSING",
                    err_message: format!("Token missing: {msg}"),
                },
                HttpErrorResponse::WrongTokenType(msg) => ServerErrorResponse {
                    err_type: "WRONG_TOKEN_TYPE",
                    err_message: format!("Wrong token type: {msg}"),
                },
                HttpErrorResponse::UserDisallowed(msg) => ServerErrorResponse {
                    err_type: "USER_DISALLOWED",
                    err_message: format!("User disallowed: {msg}"),
                },
                HttpErrorResponse::DoesNotExist(msg) => ServerErrorResponse {
                    err_type: "DOES_NOT_EXIST",
                    err_message: format!("Does not exist: {msg}"),
                },
                HttpErrorResponse::ConflictWithExisting(msg) => ServerErrorResponse {
                    err_type: "CONFLICT_WITH_EXISTING",
                    err_message: format!("Conflict with existing data: {msg}"),
                },
                HttpErrorResponse::InternalError(msg) => ServerErrorResponse {
                    err_type: "INTERNAL_ERROR",
                    err_message: format!("Internal error: {msg}"),
                },
            }
        }
    }

    impl actix_web::error::ResponseError for HttpErrorResponse {
        fn error_response(&self) -> HttpResponse {
            HttpResponseBuilder::new(self.status_code())
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .json(ServerErrorResponse::from(self))
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                HttpErrorResponse::IncorrectlyFormed(_) => StatusCode::BAD_REQUEST,
                HttpErrorResponse::IncorrectCredential(_)
                | HttpErrorResponse::TokenExpired(_)
                | HttpErrorResponse::TokenMissing(_)
                | HttpErrorResponse::WrongTokenType(_) => StatusCode::UNAUTHORIZED,
                HttpErrorResponse::UserDisallowed(_) => StatusCode::FORBIDDEN,
                HttpErrorResponse::DoesNotExist(_) => StatusCode::NOT_FOUND,
                HttpErrorResponse::ConflictWithExisting(_) => StatusCode::CONFLICT,
                HttpErrorResponse::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<oneshot::error::RecvError> for HttpErrorResponse {
        fn from(_err: oneshot::error::RecvError) -> Self {
            HttpErrorResponse::InternalError(String::from("Rayon thread pool failure"))
        }
    }

    impl From<TokenError> for HttpErrorResponse {
        fn from(err: TokenError) -> Self {
            match err {
                TokenError::TokenInvalid => {
                    HttpErrorResponse::IncorrectCredential(String::from("Invalid token"))
                }
                TokenError::TokenExpired => {
                    HttpErrorResponse::TokenExpired(String::from("Token expired"))
                }
                TokenError::TokenMissing => {
                    HttpErrorResponse::TokenMissing(String::from("Missing token"))
                }
                TokenError::WrongTokenType => {
                    HttpErrorResponse::WrongTokenType(String::from("Wrong token type"))
                }
            }
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use places_common::db;
    use places_common::geocoding::GeocodeClient;
    use places_common::models::user::User;
    use places_common::request_io::InputUser;
    use places_common::token::auth_token::{AuthToken, AuthTokenType, NewAuthTokenClaims};

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    use crate::env;

    pub fn geocode_client() -> GeocodeClient {
        GeocodeClient::new(&env::CONF.geocode_api_url, &env::CONF.geocode_api_key)
    }

    pub fn test_input_user() -> InputUser {
        let user_number = Uuid::now_v7().as_u128();

        InputUser {
            username: format!("test-user-{user_number}"),
            email: format!("test-user-{user_number}@places.test"),
            password: String::from("tr0ub4dor&3-correct-horse"),

            city: String::from("Gelsenkirchen"),
            zip_code: String::from("45897"),
            street: String::from("Neidenburger Str."),
            house_number: String::from("43"),
            mobile: String::from("+49 170 0000000"),
        }
    }

    pub fn gen_access_token(user: &User) -> String {
        let claims = NewAuthTokenClaims {
            user_id: user.id,
            user_email: &user.email,
            expiration: (SystemTime::now() + env::CONF.access_token_lifetime)
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
            token_type: AuthTokenType::Access,
        };

        AuthToken::sign_new(claims, &env::CONF.token_signing_key)
    }

    /// Registers a user through the registration endpoint and returns the
    /// stored record together with a valid access token for it.
    pub async fn create_user() -> (User, String) {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let new_user = test_input_user();

        let req = TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&new_user)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);

        let user_dao = db::user::Dao::new(&env::testing::DB_ASYNC_POOL);
        let user = user_dao.get_user_by_email(&new_user.email).await.unwrap();

        let access_token = gen_access_token(&user);

        (user, access_token)
    }

    pub async fn delete_user(user_id: Uuid) {
        use diesel::QueryDsl;
        use places_common::schema::users::dsl::users;

        if let Ok(mut conn) = env::testing::DB_ASYNC_POOL.get().await {
            let _ =
                diesel_async::RunQueryDsl::execute(diesel::delete(users.find(user_id)), &mut conn)
                    .await;
        }
    }
}

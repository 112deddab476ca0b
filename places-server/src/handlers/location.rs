use places_common::db::{self, DaoError, DbAsyncPool};
use places_common::geocoding::{self, GeocodeClient, GeocodeError};
use places_common::request_io::{InputLocation, OutputFriendLocation, OutputLocation};

use actix_web::{web, HttpResponse};

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn add_location(
    db_async_pool: web::Data<DbAsyncPool>,
    geocode_client: web::Data<GeocodeClient>,
    auth_token: VerifiedToken<Access, FromHeader>,
    location_data: web::Json<InputLocation>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let location_data = location_data.into_inner();

    let (latitude, longitude, formatted_address) = match (
        location_data.latitude,
        location_data.longitude,
        &location_data.street,
        &location_data.house_number,
        &location_data.city,
        &location_data.country,
    ) {
        (Some(latitude), Some(longitude), ..) => {
            // Bounds are checked before anything is persisted or sent to the API
            if let Err(GeocodeError::OutOfRange(coord)) =
                geocoding::validate_coordinates(latitude, longitude)
            {
                return Err(HttpErrorResponse::IncorrectlyFormed(format!(
                    "The given {coord} is out of range",
                )));
            }

            // A failed reverse lookup doesn't block recording the position
            let formatted_address = match geocode_client.reverse(latitude, longitude).await {
                Ok(data) => data.formatted,
                Err(e) => {
                    log::warn!("Reverse geocoding failed: {e}");
                    String::from("Unknown address at coordinates")
                }
            };

            (latitude, longitude, formatted_address)
        }
        (_, _, Some(street), Some(house_number), Some(city), Some(country)) => {
            let data = match geocode_client
                .search_by_address(street, house_number, city, country)
                .await
            {
                Ok(d) => d,
                Err(GeocodeError::NoMatch) => {
                    return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
                        "The given address could not be resolved to coordinates",
                    )));
                }
                Err(e) => {
                    log::error!("{e}");
                    return Err(HttpErrorResponse::InternalError(String::from(
                        "Failed to geocode address",
                    )));
                }
            };

            (data.lat, data.lon, data.formatted)
        }
        _ => {
            return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
                "Either coordinates or a full street address (street, house number, city, \
                 and country) must be provided",
            )));
        }
    };

    let location_dao = db::location::Dao::new(&db_async_pool);
    let location = match location_dao
        .create_location(
            auth_token.claims.user_id,
            latitude,
            longitude,
            &formatted_address,
            location_data.location_name.as_deref(),
        )
        .await
    {
        Ok(l) => l,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to record location",
            )));
        }
    };

    Ok(HttpResponse::Created().json(OutputLocation::from(location)))
}

pub async fn get_latest_location(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let location_dao = db::location::Dao::new(&db_async_pool);
    let location = match location_dao
        .get_latest_location(auth_token.claims.user_id)
        .await
    {
        Ok(l) => l,
        Err(DaoError::QueryFailure(diesel::result::Error::NotFound)) => {
            return Err(HttpErrorResponse::DoesNotExist(String::from(
                "No location has been recorded for this user",
            )));
        }
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to fetch latest location",
            )));
        }
    };

    Ok(HttpResponse::Ok().json(OutputLocation::from(location)))
}

pub async fn get_all_locations(
    db_async_pool: web::Data<DbAsyncPool>,
    auth_token: VerifiedToken<Access, FromHeader>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let location_dao = db::location::Dao::new(&db_async_pool);
    let locations = match location_dao
        .get_all_locations(auth_token.claims.user_id)
        .await
    {
        Ok(l) => l,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to fetch location history",
            )));
        }
    };

    let locations: Vec<OutputLocation> = locations.into_iter().map(OutputLocation::from).collect();

    Ok(HttpResponse::Ok().json(locations))
}

/// Returns the latest known location of each of the requesting user's
/// friends. Friends without any recorded location are omitted.
pub async fn get_friends_locations(
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

    let friend_ids: Vec<_> = friends.iter().map(|f| f.id).collect();

    let location_dao = db::location::Dao::new(&db_async_pool);
    let locations = match location_dao
        .get_latest_locations_for_users(&friend_ids)
        .await
    {
        Ok(l) => l,
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to fetch friend locations",
            )));
        }
    };

    let friend_locations: Vec<OutputFriendLocation> = locations
        .into_iter()
        .filter_map(|location| {
            let friend = friends.iter().find(|f| f.id == location.user_id)?;

            Some(OutputFriendLocation {
                user_id: friend.id,
                username: friend.username.clone(),
                latitude: location.latitude,
                longitude: location.longitude,
                formatted_address: location.formatted_address,
                location_name: location.location_name,
                created_timestamp: location.created_timestamp,
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(friend_locations))
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;

    use crate::env;
    use crate::handlers::test_utils;

    #[actix_web::test]
    async fn test_add_location_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let req = TestRequest::post()
            .uri("/api/location")
            .set_json(InputLocation {
                latitude: Some(51.5741),
                longitude: Some(7.0277),
                street: None,
                house_number: None,
                city: None,
                country: None,
                location_name: None,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_add_location_rejects_out_of_range_coordinates() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, access_token) = test_utils::create_user().await;

        for (latitude, longitude) in [(91.0, 0.0), (-90.5, 0.0), (0.0, 181.0), (0.0, -180.5)] {
            let req = TestRequest::post()
                .uri("/api/location")
                .insert_header(("AccessToken", access_token.as_str()))
                .set_json(InputLocation {
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    street: None,
                    house_number: None,
                    city: None,
                    country: None,
                    location_name: None,
                })
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        // Nothing may have been persisted for the rejected coordinates
        let req = TestRequest::get()
            .uri("/api/location/all")
            .insert_header(("AccessToken", access_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let history: serde_json::Value = test::read_body_json(resp).await;
        assert!(history.as_array().unwrap().is_empty());

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_add_location_rejects_partial_input() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, access_token) = test_utils::create_user().await;

        // Latitude without longitude, and an address missing its city
        let partial_inputs = [
            InputLocation {
                latitude: Some(51.5741),
                longitude: None,
                street: None,
                house_number: None,
                city: None,
                country: None,
                location_name: None,
            },
            InputLocation {
                latitude: None,
                longitude: None,
                street: Some(String::from("Neidenburger Str.")),
                house_number: Some(String::from("43")),
                city: None,
                country: Some(String::from("Germany")),
                location_name: None,
            },
        ];

        for input in partial_inputs {
            let req = TestRequest::post()
                .uri("/api/location")
                .insert_header(("AccessToken", access_token.as_str()))
                .set_json(input)
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_add_location_degrades_when_reverse_geocoding_is_unreachable() {
        // Nothing listens on this address, so every reverse lookup fails
        let unreachable_client = GeocodeClient::new("http://127.0.0.1:9", "unused-key");

        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(unreachable_client))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, access_token) = test_utils::create_user().await;

        let req = TestRequest::post()
            .uri("/api/location")
            .insert_header(("AccessToken", access_token.as_str()))
            .set_json(InputLocation {
                latitude: Some(51.5741),
                longitude: Some(7.0277),
                street: None,
                house_number: None,
                city: None,
                country: None,
                location_name: Some(String::from("Campus")),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);

        let created: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(created["latitude"], 51.5741);
        assert_eq!(created["longitude"], 7.0277);
        assert_eq!(created["formatted_address"], "Unknown address at coordinates");
        assert_eq!(created["location_name"], "Campus");

        // The record was persisted despite the failed lookup
        let req = TestRequest::get()
            .uri("/api/location/latest")
            .insert_header(("AccessToken", access_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let latest: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(latest["id"], created["id"]);
        assert_eq!(latest["formatted_address"], "Unknown address at coordinates");

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_latest_location_without_history_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, access_token) = test_utils::create_user().await;

        let req = TestRequest::get()
            .uri("/api/location/latest")
            .insert_header(("AccessToken", access_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_friends_locations_for_friendless_user_is_empty() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, access_token) = test_utils::create_user().await;

        let req = TestRequest::get()
            .uri("/api/location/friends")
            .insert_header(("AccessToken", access_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);

        let locations: serde_json::Value = test::read_body_json(resp).await;
        assert!(locations.as_array().unwrap().is_empty());

        test_utils::delete_user(user.id).await;
    }

    #[actix_web::test]
    async fn test_friends_locations_show_only_latest_per_friend() {
        let app = test::init_service(
            App::new()
                .app_data(Data::new(env::testing::DB_ASYNC_POOL.clone()))
                .app_data(Data::new(test_utils::geocode_client()))
                .configure(crate::services::api::configure),
        )
        .await;

        let (user, user_token) = test_utils::create_user().await;
        let (friend, friend_token) = test_utils::create_user().await;

        // Become friends
        let req = TestRequest::post()
            .uri("/api/friends/request")
            .insert_header(("AccessToken", user_token.as_str()))
            .set_json(places_common::request_io::InputFriendRequest {
                receiver_id: friend.id,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let request_body: serde_json::Value = test::read_body_json(resp).await;
        let request_id = request_body["id"].as_str().unwrap();

        let req = TestRequest::put()
            .uri(&format!("/api/friends/request/{request_id}/accept"))
            .insert_header(("AccessToken", friend_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Write the friend's history directly; the geocoding API isn't
        // involved in reading friends' locations
        let location_dao = db::location::Dao::new(&env::testing::DB_ASYNC_POOL);
        location_dao
            .create_location(friend.id, 51.5741, 7.0277, "Old position", None)
            .await
            .unwrap();
        let latest = location_dao
            .create_location(friend.id, 52.5200, 13.4050, "New position", None)
            .await
            .unwrap();

        let req = TestRequest::get()
            .uri("/api/location/friends")
            .insert_header(("AccessToken", user_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let locations: serde_json::Value = test::read_body_json(resp).await;
        let locations = locations.as_array().unwrap();

        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0]["user_id"], friend.id.to_string());
        assert_eq!(locations[0]["username"], friend.username.as_str());
        assert_eq!(locations[0]["formatted_address"], "New position");
        assert_eq!(locations[0]["latitude"], latest.latitude);

        // The friend sees nothing from the user, who has no history
        let req = TestRequest::get()
            .uri("/api/location/friends")
            .insert_header(("AccessToken", friend_token.as_str()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let locations: serde_json::Value = test::read_body_json(resp).await;
        assert!(locations.as_array().unwrap().is_empty());

        test_utils::delete_user(user.id).await;
        test_utils::delete_user(friend.id).await;
    }
}

use places_common::geocoding::{self, GeocodeClient, GeocodeError};
use places_common::request_io::{InputAddressQuery, InputCoordinatesQuery, OutputGeocodeResult};

use actix_web::{web, HttpResponse};

use crate::handlers::error::HttpErrorResponse;
use crate::middleware::auth::{Access, VerifiedToken};
use crate::middleware::FromHeader;

pub async fn by_zip_code(
    geocode_client: web::Data<GeocodeClient>,
    _auth_token: VerifiedToken<Access, FromHeader>,
    zip_code: web::Path<String>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let zip_code = zip_code.into_inner();

    if zip_code.trim().is_empty() {
        return Err(HttpErrorResponse::IncorrectlyFormed(String::from(
            "Zip code must not be empty",
        )));
    }

    let data = geocode_client
        .search_by_postal_code(&zip_code)
        .await
        .map_err(geocode_error)?;

    Ok(HttpResponse::Ok().json(OutputGeocodeResult::from(data)))
}

pub async fn by_address(
    geocode_client: web::Data<GeocodeClient>,
    _auth_token: VerifiedToken<Access, FromHeader>,
    query: web::Query<InputAddressQuery>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let query = query.into_inner();

    let data = geocode_client
        .search_by_address(&query.street, &query.house_number, &query.city, &query.country)
        .await
        .map_err(geocode_error)?;

    Ok(HttpResponse::Ok().json(OutputGeocodeResult::from(data)))
}

pub async fn by_coordinates(
    geocode_client: web::Data<GeocodeClient>,
    _auth_token: VerifiedToken<Access, FromHeader>,
    query: web::Query<InputCoordinatesQuery>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let query = query.into_inner();

    if let Err(GeocodeError::OutOfRange(coord)) =
        geocoding::validate_coordinates(query.latitude, query.longitude)
    {
        return Err(HttpErrorResponse::IncorrectlyFormed(format!(
            "The given {coord} is out of range",
        )));
    }

    let data = geocode_client
        .reverse(query.latitude, query.longitude)
        .await
        .map_err(geocode_error)?;

    Ok(HttpResponse::Ok().json(OutputGeocodeResult::from(data)))
}

fn geocode_error(err: GeocodeError) -> HttpErrorResponse {
    match err {
        GeocodeError::NoMatch => HttpErrorResponse::DoesNotExist(String::from(
            "No location matched the given query",
        )),
        GeocodeError::OutOfRange(coord) => {
            HttpErrorResponse::IncorrectlyFormed(format!("The given {coord} is out of range"))
        }
        GeocodeError::Transport(e) => {
            log::error!("Geocoding request failed: {e}");
            HttpErrorResponse::InternalError(String::from("Failed to reach geocoding service"))
        }
        GeocodeError::BadResponse(msg) => {
            log::error!("Geocoding service returned a malformed response: {msg}");
            HttpErrorResponse::InternalError(String::from(
                "Geocoding service returned an unusable response",
            ))
        }
    }
}

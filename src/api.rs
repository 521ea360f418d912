//! Transport-agnostic boundary: request validation, response shapes, and problem details for the `/people` resource.
//!
//! A transport adapter deserializes a [`PersonRequest`], hands it to [`create_person`], and renders the result; lookups
//! go through [`find_person`]. Status codes are exposed via [`ApiError::status`] and [`CREATED`]/[`OK`].
use garde::Validate;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::error::PersonError;
use crate::person::Person;
use crate::traits::PersonService;

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

pub const PEOPLE_PATH: &str = "/people";

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct PersonRequest {
    /// Required, not blank, at most 500 characters.
    #[garde(required, custom(not_blank), length(chars, max = 500))]
    pub name: Option<String>,
    /// Required, 0 to 200.
    #[garde(required, range(min = 0, max = 200))]
    pub age:  Option<i32>,
}

// Any Unicode whitespace counts as blank.
fn not_blank(value: &Option<String>, _: &()) -> garde::Result {
    match value {
        Some(name) if name.trim().is_empty() => Err(garde::Error::new("must not be blank")),
        _ => Ok(()),
    }
}

impl PersonRequest {
    pub fn new<S: Into<String>>(name: S, age: i32) -> Self {
        Self {
            name: Some(name.into()),
            age:  Some(age),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonResponse {
    pub id:   Uuid,
    pub name: String,
    pub age:  i32,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        Self {
            id:   person.id(),
            name: person.name().to_string(),
            age:  person.age(),
        }
    }
}

/// RFC 7807 problem details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetail {
    #[serde(rename = "type")]
    pub kind:     String,
    pub title:    String,
    pub status:   u16,
    pub detail:   String,
    pub instance: String,
}

impl ProblemDetail {
    pub fn person_not_found(id: Uuid) -> Self {
        Self {
            kind:     "about:blank".to_string(),
            title:    "Person not found by ID".to_string(),
            status:   NOT_FOUND,
            detail:   format!("No person with ID {id} exists"),
            instance: person_location(id),
        }
    }
}

/// Outcome of a successful create: where the new person lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Created {
    pub location: String,
    pub person:   PersonResponse,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.detail)]
    NotFound(ProblemDetail),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error(transparent)]
    Internal(PersonError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => NOT_FOUND,
            Self::Invalid(_) => BAD_REQUEST,
            Self::Internal(_) => INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PersonError> for ApiError {
    fn from(err: PersonError) -> Self {
        match err {
            PersonError::NotFound(id) => Self::NotFound(ProblemDetail::person_not_found(id)),
            err => {
                warn!("Person service failure: {err}");
                Self::Internal(err)
            }
        }
    }
}

#[inline]
pub fn person_location(id: Uuid) -> String {
    format!("{PEOPLE_PATH}/{id}")
}

/// Parse the identity segment of a `/people/{id}` path.
pub fn parse_person_id(segment: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(segment).map_err(|e| ApiError::Invalid(format!("'{segment}' is not a person ID: {e}")))
}

pub async fn create_person<S>(service: &S, request: PersonRequest) -> Result<Created, ApiError>
where
    S: PersonService + ?Sized,
{
    request.validate().map_err(|report| ApiError::Invalid(report.to_string()))?;

    let PersonRequest {
        name: Some(name),
        age: Some(age),
    } = request
    else {
        return Err(ApiError::Invalid("name and age are required".to_string()));
    };

    let person = service.create(name, age).await?;
    Ok(Created {
        location: person_location(person.id()),
        person:   person.into(),
    })
}

pub async fn find_person<S>(service: &S, id: Uuid) -> Result<PersonResponse, ApiError>
where
    S: PersonService + ?Sized,
{
    Ok(service.find_one(id).await?.into())
}

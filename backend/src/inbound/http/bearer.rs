//! Bearer credential extraction for HTTP handlers.
//!
//! Keeps handlers focused on request/response mapping: the extractor pulls
//! the `Authorization` header, checks the `Bearer <token>` shape, and hands
//! the token to the verifier. Header absence and shape problems are
//! `missing_credential`; cryptographic and expiry failures are
//! `invalid_credential`. Both are 401s issued before any role check runs.

use std::future::{Ready, ready};

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use serde_json::json;

use crate::domain::{Error, SubjectId, TokenVerifier};

/// Authenticated subject extracted from a verified bearer credential.
#[derive(Debug, Clone)]
pub struct BearerIdentity(SubjectId);

impl BearerIdentity {
    /// The verified subject.
    #[must_use]
    pub fn subject(&self) -> &SubjectId {
        &self.0
    }

    /// Consume the extractor, yielding the verified subject.
    #[must_use]
    pub fn into_subject(self) -> SubjectId {
        self.0
    }
}

fn missing_credential(message: &str) -> Error {
    Error::unauthorized(message).with_details(json!({ "code": "missing_credential" }))
}

fn token_from_header(req: &HttpRequest) -> Result<&str, Error> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| missing_credential("authorization header is required"))?;
    let raw = value
        .to_str()
        .map_err(|_| missing_credential("authorization header must be ASCII"))?;
    let (scheme, token) = raw
        .split_once(' ')
        .ok_or_else(|| missing_credential("authorization header must be 'Bearer <token>'"))?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return Err(missing_credential(
            "authorization header must be 'Bearer <token>'",
        ));
    }
    Ok(token)
}

fn verify(req: &HttpRequest) -> Result<BearerIdentity, Error> {
    let verifier = req
        .app_data::<web::Data<TokenVerifier>>()
        .ok_or_else(|| Error::internal("token verifier is not configured"))?;
    let token = token_from_header(req)?;
    verifier.verify(token).map(BearerIdentity)
}

impl FromRequest for BearerIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify(req))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use serde_json::Value;

    use super::*;
    use crate::inbound::http::ApiResult;

    const SECRET: &[u8] = b"bearer-extractor-test-secret";

    async fn whoami(identity: BearerIdentity) -> ApiResult<HttpResponse> {
        Ok(HttpResponse::Ok().body(identity.subject().to_string()))
    }

    fn test_app() -> App<
        impl actix_web::dev::ServiceFactory<
                actix_web::dev::ServiceRequest,
                Config = (),
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
                InitError = (),
            >,
    > {
        App::new()
            .app_data(web::Data::new(TokenVerifier::new(SECRET)))
            .route("/whoami", web::get().to(whoami))
    }

    async fn detail_code_of(res: actix_web::dev::ServiceResponse) -> String {
        let value: Value = test::read_body_json(res).await;
        value
            .get("details")
            .and_then(|details| details.get("code"))
            .and_then(Value::as_str)
            .expect("details code")
            .to_owned()
    }

    #[actix_web::test]
    async fn missing_header_is_401_missing_credential() {
        let app = test::init_service(test_app()).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail_code_of(res).await, "missing_credential");
    }

    #[actix_web::test]
    async fn wrong_scheme_is_401_missing_credential() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, "Basic abc123"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail_code_of(res).await, "missing_credential");
    }

    #[actix_web::test]
    async fn garbage_token_is_401_invalid_credential() {
        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(detail_code_of(res).await, "invalid_credential");
    }

    #[actix_web::test]
    async fn valid_token_yields_subject() {
        let verifier = TokenVerifier::new(SECRET);
        let subject = SubjectId::new("ada@example.com").expect("valid subject");
        let token = verifier.issue(&subject).expect("issue token");

        let app = test::init_service(test_app()).await;
        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
        let body = test::read_body(res).await;
        assert_eq!(body.as_ref(), b"ada@example.com");
    }
}

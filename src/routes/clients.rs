use actix_web::{HttpResponse, Responder, get, post, web};

use crate::dto::api::{
    CLIENT_LIST_FAILED, CLIENT_REGISTERED, CLIENT_REGISTRATION_FAILED, ErrorResponse,
    MessageResponse,
};
use crate::forms::clients::AddClientForm;
use crate::repository::JsonRepository;
use crate::services::{ServiceError, clients as client_service};

#[get("/clientes")]
pub async fn list_clients(repo: web::Data<JsonRepository>) -> impl Responder {
    match client_service::list_clients(repo.get_ref()) {
        Ok(clients) => HttpResponse::Ok().json(clients),
        Err(err) => HttpResponse::InternalServerError()
            .json(ErrorResponse::new(CLIENT_LIST_FAILED, Some(err.to_string()))),
    }
}

/// Accepts the client either as JSON or as an urlencoded form.
#[post("/clientes")]
pub async fn add_client(
    body: web::Either<web::Json<AddClientForm>, web::Form<AddClientForm>>,
    repo: web::Data<JsonRepository>,
) -> impl Responder {
    let form = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    match client_service::add_client(repo.get_ref(), form) {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(CLIENT_REGISTERED)),
        Err(ServiceError::Form(message)) => {
            HttpResponse::BadRequest().json(ErrorResponse::new(message, None))
        }
        Err(err) => HttpResponse::InternalServerError().json(ErrorResponse::new(
            CLIENT_REGISTRATION_FAILED,
            Some(err.to_string()),
        )),
    }
}

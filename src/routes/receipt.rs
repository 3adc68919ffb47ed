use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, post, web};

use crate::domain::receipt::ServiceReport;
use crate::dto::api::{ErrorResponse, RECEIPT_FAILED, ReceiptIssued};
use crate::forms::receipt::ReceiptUploadForm;
use crate::repository::JsonRepository;
use crate::routes::error_response;
use crate::services::ServiceResult;
use crate::services::notifier::ReceiptNotifier;
use crate::services::receipt::{IssuedReceipt, ReceiptPipeline};

/// Stores the uploads, then runs the whole pipeline on the blocking pool.
#[post("/boleta")]
pub async fn submit_receipt(
    MultipartForm(form): MultipartForm<ReceiptUploadForm>,
    pipeline: web::Data<ReceiptPipeline>,
    repo: web::Data<JsonRepository>,
    notifier: web::Data<dyn ReceiptNotifier>,
) -> impl Responder {
    let (input, uploads) = form.into_parts();

    if let Err(err) = pipeline.check_photo_count(uploads.len()) {
        return error_response(RECEIPT_FAILED, &err);
    }

    let outcome = web::block(move || -> ServiceResult<IssuedReceipt> {
        let originals = pipeline.intake().store_all(uploads)?;
        pipeline.issue(
            repo.get_ref(),
            notifier.get_ref(),
            ServiceReport::from(input),
            originals,
        )
    })
    .await;

    match outcome {
        Ok(Ok(issued)) => HttpResponse::Ok().json(ReceiptIssued::from(issued.number)),
        Ok(Err(err)) => error_response(RECEIPT_FAILED, &err),
        Err(err) => {
            log::error!("Receipt worker failed: {err}");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(RECEIPT_FAILED, Some(err.to_string())))
        }
    }
}

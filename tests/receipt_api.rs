use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use actix_multipart::form::tempfile::TempFileConfig;
use actix_web::{App, http::StatusCode, http::header, test, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use jym_boletas::domain::types::ReceiptNumber;
use jym_boletas::render::ReceiptRenderer;
use jym_boletas::repository::JsonRepository;
use jym_boletas::routes::{TEXT_FIELDS_LIMIT, configure_api, multipart_config};
use jym_boletas::services::notifier::{NotifyError, ReceiptNotifier};
use jym_boletas::services::photos::{PhotoIntake, PhotoOptimizer};
use jym_boletas::services::receipt::ReceiptPipeline;

const BOUNDARY: &str = "----boleta-test-boundary";

/// Remembers every delivery and how many optimized photos existed at the time.
struct RecordingNotifier {
    optimized_dir: PathBuf,
    sent: Mutex<Vec<(String, PathBuf, u64, usize)>>,
}

impl ReceiptNotifier for RecordingNotifier {
    fn send_receipt(
        &self,
        to: &str,
        document: &Path,
        number: ReceiptNumber,
    ) -> Result<(), NotifyError> {
        let optimized = file_count(&self.optimized_dir);
        self.sent.lock().unwrap().push((
            to.to_string(),
            document.to_path_buf(),
            number.get(),
            optimized,
        ));
        Ok(())
    }
}

struct Fixture {
    _root: TempDir,
    uploads: PathBuf,
    optimized: PathBuf,
    output: PathBuf,
    repo: JsonRepository,
    pipeline: web::Data<ReceiptPipeline>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    let root = TempDir::new().unwrap();
    let uploads = root.path().join("fotos");
    let optimized = root.path().join("fotos-opt");
    let output = root.path().join("boletas");
    fs::create_dir_all(&uploads).unwrap();

    let repo = JsonRepository::new(
        root.path().join("clientes.json"),
        root.path().join("boleta-counter.json"),
        true,
    );
    let pipeline = web::Data::new(ReceiptPipeline::new(
        PhotoIntake::new(&uploads),
        PhotoOptimizer::new(&optimized, 1024, 768, 70),
        ReceiptRenderer::new(&output, None, 5),
        8,
    ));
    let notifier = Arc::new(RecordingNotifier {
        optimized_dir: optimized.clone(),
        sent: Mutex::new(Vec::new()),
    });

    Fixture {
        _root: root,
        uploads,
        optimized,
        output,
        repo,
        pipeline,
        notifier,
    }
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([30, 144, 255]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn multipart_body(fields: &[(&str, &str)], photos: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, bytes) in photos {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fotos\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn submission(body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/boleta")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

macro_rules! app {
    ($fx:expr) => {{
        let notifier: Arc<dyn ReceiptNotifier> = $fx.notifier.clone();
        test::init_service(
            App::new()
                .app_data(multipart_config(100))
                .app_data(TempFileConfig::default().directory(&$fx.uploads))
                .app_data(web::Data::new($fx.repo.clone()))
                .app_data($fx.pipeline.clone())
                .app_data(web::Data::from(notifier))
                .configure(configure_api),
        )
        .await
    }};
}

#[actix_web::test]
async fn three_photo_submission_is_numbered_emailed_and_cleaned() {
    let fx = fixture();
    let app = app!(fx);

    let body = multipart_body(
        &[
            ("nombreCliente", "Ana Rojas"),
            ("correoCliente", "ana@example.com"),
            ("fecha", "2025-03-14"),
            ("checklist", "Limpieza de filtros"),
            ("checklist", "Revisión eléctrica"),
            ("encargado", "Pedro"),
        ],
        &[
            ("uno.png", png_bytes(1600, 1200)),
            ("dos.png", png_bytes(800, 600)),
            ("tres.png", png_bytes(300, 900)),
        ],
    );
    let resp = test::call_service(&app, submission(body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({"mensaje": "Boleta enviada correctamente", "numeroBoleta": "000001"})
    );

    let sent = fx.notifier.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    let (to, document, number, optimized_at_send) = &sent[0];
    assert_eq!(to, "ana@example.com");
    assert_eq!(document, &fx.output.join("boleta-000001.pdf"));
    assert_eq!(*number, 1);
    assert_eq!(*optimized_at_send, 3);

    assert!(document.exists());
    assert_eq!(file_count(&fx.output), 1);
    assert_eq!(file_count(&fx.uploads), 0);
    assert_eq!(file_count(&fx.optimized), 0);
}

#[actix_web::test]
async fn consecutive_submissions_get_consecutive_numbers() {
    let fx = fixture();
    let app = app!(fx);

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let body = multipart_body(&[("nombreCliente", "Sin correo")], &[]);
        let resp = test::call_service(&app, submission(body).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        numbers.push(body["numeroBoleta"].as_str().unwrap().to_string());
    }

    assert_eq!(numbers, vec!["000001", "000002"]);
    assert!(fx.notifier.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn too_many_photos_is_a_bad_request() {
    let fx = fixture();
    let app = app!(fx);

    let photos: Vec<(&str, Vec<u8>)> = (0..9).map(|_| ("f.png", png_bytes(8, 8))).collect();
    let body = multipart_body(&[("correoCliente", "ana@example.com")], &photos);
    let resp = test::call_service(&app, submission(body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["mensaje"], "Error al enviar la boleta");
    assert!(body["error"].is_string());
    assert_eq!(file_count(&fx.output), 0);
    assert!(fx.notifier.sent.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn broken_photo_fails_without_consuming_a_number() {
    let fx = fixture();
    let app = app!(fx);

    let body = multipart_body(
        &[("correoCliente", "ana@example.com")],
        &[("ok.png", png_bytes(10, 10)), ("rota.png", b"not a png".to_vec())],
    );
    let resp = test::call_service(&app, submission(body).to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["mensaje"], "Error al enviar la boleta");
    assert_eq!(file_count(&fx.uploads), 0);
    assert_eq!(file_count(&fx.optimized), 0);
    assert_eq!(file_count(&fx.output), 0);

    let body = multipart_body(&[("fecha", "2025-03-14")], &[]);
    let resp = test::call_service(&app, submission(body).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["numeroBoleta"], "000001");
}

#[actix_web::test]
async fn oversized_text_fields_are_rejected_before_rendering() {
    let fx = fixture();
    let app = app!(fx);

    let name = "A".repeat(TEXT_FIELDS_LIMIT + 1);
    let body = multipart_body(
        &[("nombreCliente", &name), ("correoCliente", "ana@example.com")],
        &[],
    );
    let resp = test::call_service(&app, submission(body).to_request()).await;

    assert!(resp.status().is_client_error());
    assert_eq!(file_count(&fx.output), 0);
    assert!(fx.notifier.sent.lock().unwrap().is_empty());

    let body = multipart_body(&[("fecha", "2025-03-14")], &[]);
    let resp = test::call_service(&app, submission(body).to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["numeroBoleta"], "000001");
}

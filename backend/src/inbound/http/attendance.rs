//! Attendance HTTP handlers.
//!
//! ```text
//! POST /frequencia/{cr}
//! GET  /frequencia/{cr}/{controlNumber}?verificacao={code}
//! PUT  /frequencia/{cr}/{controlNumber}?verificacao={code}
//! ```
//!
//! Bodies are decoded by hand so an empty body reads as an empty form and
//! every missing field is reported by domain validation.

use std::sync::OnceLock;

use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    ConfirmAttendanceRequest, GetAttendanceRequest, RegisterAttendanceRequest,
    RegisterAttendanceResponse,
};
use crate::domain::{Attendance, Error, ErrorCode, ErrorMessage, RegistrationInput};
use crate::inbound::http::{ApiResult, JSON_CONTENT_TYPE};
use crate::inbound::http::remote_addr::remote_addr;
use crate::inbound::http::schemas::ErrorMessageSchema;
use crate::inbound::http::state::HttpState;

/// Registration form.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterAttendanceBody {
    #[schema(example = "calibre .380")]
    pub calibre: Option<String>,
    #[schema(example = "arma do clube")]
    pub arma_utilizada: Option<String>,
    #[schema(example = "za785671")]
    pub numero_serie: Option<String>,
    pub guia_de_trafego: Option<i64>,
    #[schema(example = 50)]
    pub quantidade_municao: Option<i64>,
    #[schema(format = "date-time")]
    pub data_inicio_treino: Option<String>,
    #[schema(format = "date-time")]
    pub data_termino_treino: Option<String>,
}

/// Registration outcome.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAttendanceResponseBody {
    #[schema(example = "1-4876238461")]
    pub control_number: String,
    /// Base64 PNG of the control-number ticket.
    pub image: String,
    pub verification_code: String,
}

/// Confirmation form.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct ConfirmAttendanceBody {
    /// Base64 photograph of the ticket taken on site.
    #[serde(alias = "image")]
    pub imagem: Option<String>,
}

/// Query string carrying the verification code.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VerificationQuery {
    pub verificacao: Option<String>,
}

/// Public projection of an attendance.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AttendanceResponseBody {
    pub cr: String,
    #[serde(rename = "controlNumber")]
    pub control_number: String,
    pub calibre: String,
    #[serde(rename = "armaUtilizada")]
    pub arma_utilizada: String,
    #[serde(rename = "numeroSerie")]
    pub numero_serie: String,
    #[serde(rename = "guiaDeTrafego")]
    pub guia_de_trafego: Option<i64>,
    #[serde(rename = "quantidadeMunicao")]
    pub quantidade_municao: u32,
    #[serde(rename = "dataInicioTreino")]
    #[schema(value_type = String, format = DateTime)]
    pub data_inicio_treino: DateTime<Utc>,
    #[serde(rename = "dataTerminoTreino")]
    #[schema(value_type = String, format = DateTime)]
    pub data_termino_treino: DateTime<Utc>,
    #[serde(rename = "dataCriacao")]
    #[schema(value_type = String, format = DateTime)]
    pub data_criacao: DateTime<Utc>,
    #[serde(rename = "dataConfirmacao")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub data_confirmacao: Option<DateTime<Utc>>,
    #[serde(rename = "imagemNumeroControle")]
    pub imagem_numero_controle: String,
}

impl From<Attendance> for AttendanceResponseBody {
    fn from(value: Attendance) -> Self {
        Self {
            control_number: value.control_number().to_string(),
            cr: value.cr,
            calibre: value.caliber,
            arma_utilizada: value.weapon,
            numero_serie: value.serial_number,
            guia_de_trafego: value.traffic_guide,
            quantidade_municao: value.ammunition_count,
            data_inicio_treino: value.training_start,
            data_termino_treino: value.training_end,
            data_criacao: value.created_at,
            data_confirmacao: value.confirmed_at,
            imagem_numero_controle: value.control_number_image,
        }
    }
}

impl From<RegisterAttendanceResponse> for RegisterAttendanceResponseBody {
    fn from(value: RegisterAttendanceResponse) -> Self {
        Self {
            control_number: value.control_number.to_string(),
            image: value.image,
            verification_code: value.verification_code,
        }
    }
}

/// RFC 3339 timestamp, or `None` when absent or unparseable.
fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

impl RegisterAttendanceBody {
    fn into_input(self, cr: String) -> RegistrationInput {
        RegistrationInput {
            cr,
            caliber: self.calibre.unwrap_or_default(),
            weapon: self.arma_utilizada.unwrap_or_default(),
            serial_number: self.numero_serie.unwrap_or_default(),
            traffic_guide: self.guia_de_trafego,
            ammunition_count: self.quantidade_municao.unwrap_or_default(),
            training_start: parse_timestamp(self.data_inicio_treino),
            training_end: parse_timestamp(self.data_termino_treino),
        }
    }
}

/// Decode a JSON body; a blank body decodes as `T::default()`.
fn parse_body<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        Error::from_message(ErrorMessage::new(ErrorCode::RequiredField).with_value(err.to_string()))
            .with_context("decode request body")
    })
}

fn location_base() -> &'static Url {
    static BASE: OnceLock<Url> = OnceLock::new();
    BASE.get_or_init(|| {
        Url::parse("http://localhost/")
            .unwrap_or_else(|error| panic!("location base URL must parse: {error}"))
    })
}

/// Relative link to an attendance, percent-encoded.
///
/// # Examples
/// ```
/// use frequencia::inbound::http::attendance::attendance_location;
///
/// assert_eq!(
///     attendance_location("380308", "1-2", "abc"),
///     "/frequencia/380308/1-2?verificacao=abc"
/// );
/// ```
pub fn attendance_location(cr: &str, control_number: &str, verification_code: &str) -> String {
    let mut url = location_base().clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["frequencia", cr, control_number]);
    }
    url.query_pairs_mut()
        .append_pair("verificacao", verification_code);
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

/// Register a training visit and render its control-number ticket.
#[utoipa::path(
    post,
    path = "/frequencia/{cr}",
    params(("cr" = String, Path, description = "Club registration of the shooter")),
    request_body = RegisterAttendanceBody,
    responses(
        (status = 201, description = "Attendance registered", body = RegisterAttendanceResponseBody,
            headers(("Location" = String, description = "Link to the attendance"))),
        (status = 400, description = "Invalid registration", body = [ErrorMessageSchema]),
        (status = 500, description = "Rendering or storage failure", body = [ErrorMessageSchema])
    ),
    tags = ["frequencia"],
    operation_id = "registerAttendance"
)]
#[post("/frequencia/{cr}")]
pub async fn register_attendance(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let payload: RegisterAttendanceBody = parse_body(&body)?;
    let cr = path.into_inner();
    let response = state
        .attendance
        .register(RegisterAttendanceRequest {
            input: payload.into_input(cr.clone()),
            remote_addr: remote_addr(&req),
        })
        .await?;

    let body = RegisterAttendanceResponseBody::from(response);
    let location = attendance_location(cr.trim(), &body.control_number, &body.verification_code);
    Ok(HttpResponse::Created()
        .insert_header((LOCATION, location))
        .content_type(JSON_CONTENT_TYPE)
        .json(body))
}

/// Read an attendance through its verification link.
#[utoipa::path(
    get,
    path = "/frequencia/{cr}/{controlNumber}",
    params(
        ("cr" = String, Path, description = "Club registration of the shooter"),
        ("controlNumber" = String, Path, description = "Control number `<id>-<control>`"),
        VerificationQuery
    ),
    responses(
        (status = 200, description = "Attendance found", body = AttendanceResponseBody),
        (status = 400, description = "Mismatched link", body = [ErrorMessageSchema]),
        (status = 404, description = "Unknown control number", body = [ErrorMessageSchema])
    ),
    tags = ["frequencia"],
    operation_id = "getAttendance"
)]
#[get("/frequencia/{cr}/{control_number}")]
pub async fn get_attendance(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    query: web::Query<VerificationQuery>,
) -> ApiResult<HttpResponse> {
    let (cr, control_number) = path.into_inner();
    let attendance = state
        .attendance_query
        .get(GetAttendanceRequest {
            cr,
            control_number,
            verification_code: query.into_inner().verificacao,
        })
        .await?;
    Ok(HttpResponse::Ok()
        .content_type(JSON_CONTENT_TYPE)
        .json(AttendanceResponseBody::from(attendance)))
}

/// Confirm an attendance with the photograph taken on site.
#[utoipa::path(
    put,
    path = "/frequencia/{cr}/{controlNumber}",
    params(
        ("cr" = String, Path, description = "Club registration of the shooter"),
        ("controlNumber" = String, Path, description = "Control number `<id>-<control>`"),
        VerificationQuery
    ),
    request_body = ConfirmAttendanceBody,
    responses(
        (status = 204, description = "Attendance confirmed"),
        (status = 400, description = "Invalid confirmation", body = [ErrorMessageSchema]),
        (status = 404, description = "Unknown control number", body = [ErrorMessageSchema]),
        (status = 409, description = "Concurrent confirmation won", body = [ErrorMessageSchema])
    ),
    tags = ["frequencia"],
    operation_id = "confirmAttendance"
)]
#[put("/frequencia/{cr}/{control_number}")]
pub async fn confirm_attendance(
    state: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<VerificationQuery>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let payload: ConfirmAttendanceBody = parse_body(&body)?;
    let (cr, control_number) = path.into_inner();
    state
        .attendance
        .confirm(ConfirmAttendanceRequest {
            cr,
            control_number,
            image: payload.imagem.unwrap_or_default(),
            verification_code: query.into_inner().verificacao,
            remote_addr: remote_addr(&req),
        })
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "attendance_tests.rs"]
mod tests;

//! The demo service: contracts and handlers.
//!
//! | Operation | Route |
//! |-----------|-------|
//! | `home` | `GET /` |
//! | `read_items` | `GET /items` |
//! | `read_item` | `GET /items/{item_id}` |
//! | `read_item_short` | `GET /item/{item_id}` |
//! | `create_item` | `POST /item` |
//! | `update_item` | `PUT /item/{item_id}` |
//! | `get_model` | `GET /model/{model_name}` |
//! | `create_multiple_images` | `POST /images/multiple/` |
//! | `create_index_weights` | `POST /index-weights/` |
//! | `create_event` | `POST /event/{event_id}` |
//! | `create_user` | `POST /user/` |
//! | `create_upload` | `POST /uploads/` |

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta};
use http::{Method, StatusCode};

use tessera_bind::ParamBundle;
use tessera_config::TesseraConfig;
use tessera_core::{
    BoundValue, ContractError, DerivedField, HttpError, ModelInstance, ParameterSpec,
    RouteContract, ShapePolicy, TargetType, UploadedFile,
};

use crate::app::{App, AppBuilder, AppState};
use crate::{models, HandlerError};

type HandlerResult = Result<BoundValue, HandlerError>;

/// Builds the demo application from a loaded configuration.
///
/// # Errors
///
/// Returns a [`ContractError`] if any contract is inconsistent.
pub fn demo_app(config: &TesseraConfig, state: AppState) -> Result<App, ContractError> {
    register(App::builder().config(config).state(state))?.build()
}

/// Adds every demo route to a builder.
///
/// # Errors
///
/// Returns a [`ContractError`] if any contract is inconsistent.
pub fn register(builder: AppBuilder) -> Result<AppBuilder, ContractError> {
    let image = models::image()?;
    let item = models::item(&image)?;

    let home_contract = RouteContract::builder("home", Method::GET, "/")
        .param(
            ParameterSpec::header("x_dummy_header", TargetType::sequence(TargetType::String))
                .optional(),
        )
        .build()?;

    let read_items_contract = RouteContract::builder("read_items", Method::GET, "/items")
        .param(
            ParameterSpec::query("q", TargetType::String)
                .optional()
                .min_length(3)
                .max_length(50)
                .pattern(r"^\w+$")
                .title("Query string")
                .description("Query string for the items to search"),
        )
        .param(
            ParameterSpec::query("q2", TargetType::sequence(TargetType::String))
                .alias("q-2")
                .default(vec!["aa", "bb", "cc"]),
        )
        .param(ParameterSpec::query("q3", TargetType::String).optional().deprecated())
        .param(
            ParameterSpec::cookie("ads_id", TargetType::String)
                .optional()
                .max_length(128)
                .example("70f59c6b".into()),
        )
        .build()?;

    let create_item_contract = RouteContract::builder("create_item", Method::POST, "/item")
        .param(ParameterSpec::body("item", TargetType::model(Arc::clone(&item))))
        .param(ParameterSpec::header("x_token", TargetType::String))
        .status(StatusCode::CREATED)
        .policy(
            ShapePolicy::new()
                .derive(DerivedField::sum("price_with_tax", ["price", "tax"]).when_truthy("tax")),
        )
        .build()?;

    let update_item_contract = RouteContract::builder("update_item", Method::PUT, "/item/{item_id}")
        .param(ParameterSpec::path("item_id", TargetType::Integer).ge(1).title("The ID of the item"))
        .param(ParameterSpec::body_field("item", TargetType::model(item)))
        .param(ParameterSpec::body_field("user", TargetType::model(models::user()?)).optional())
        .param(ParameterSpec::body_field("importance", TargetType::Integer).default(1i64).ge(0).le(9))
        .param(ParameterSpec::query("q", TargetType::String).optional())
        .build()?;

    let get_model_contract = RouteContract::builder("get_model", Method::GET, "/model/{model_name}")
        .param(ParameterSpec::path("model_name", TargetType::Enum(models::model_name())))
        .build()?;

    let images_contract =
        RouteContract::builder("create_multiple_images", Method::POST, "/images/multiple/")
            .param(ParameterSpec::body(
                "images",
                TargetType::sequence(TargetType::model(image)),
            ))
            .status(StatusCode::CREATED)
            .build()?;

    let weights_contract =
        RouteContract::builder("create_index_weights", Method::POST, "/index-weights/")
            .param(ParameterSpec::body(
                "weights",
                TargetType::mapping(TargetType::Integer, TargetType::Decimal),
            ))
            .status(StatusCode::CREATED)
            .build()?;

    let event_contract = RouteContract::builder("create_event", Method::POST, "/event/{event_id}")
        .param(ParameterSpec::path("event_id", TargetType::Uuid))
        .param(ParameterSpec::body_field("start_datetime", TargetType::DateTime).optional())
        .param(ParameterSpec::body_field("end_datetime", TargetType::DateTime).optional())
        .param(ParameterSpec::body_field("repeat_at", TargetType::Time).optional())
        .param(ParameterSpec::body_field("process_after", TargetType::Duration).optional())
        .status(StatusCode::CREATED)
        .build()?;

    let user_contract = RouteContract::builder("create_user", Method::POST, "/user/")
        .param(ParameterSpec::body("user", TargetType::model(models::user_in()?)))
        .status(StatusCode::CREATED)
        .policy(
            ShapePolicy::new()
                .response_model(models::user_out()?)
                .exclude_unset(),
        )
        .build()?;

    let upload_contract = RouteContract::builder("create_upload", Method::POST, "/uploads/")
        .param(ParameterSpec::form_field("description", TargetType::String).optional())
        .param(ParameterSpec::file("file"))
        .status(StatusCode::CREATED)
        .build()?;

    Ok(builder
        .route(home_contract, home)
        .route(read_items_contract, read_items)
        .route(read_item_contract("read_item", "/items/{item_id}")?, read_item)
        .route(read_item_contract("read_item_short", "/item/{item_id}")?, read_item)
        .route(create_item_contract, create_item)
        .route(update_item_contract, update_item)
        .route(get_model_contract, get_model)
        .route(images_contract, echo_param("images"))
        .route(weights_contract, echo_param("weights"))
        .route(event_contract, create_event)
        .route(user_contract, echo_param("user"))
        .route(upload_contract, create_upload))
}

fn read_item_contract(operation_id: &str, path: &str) -> Result<RouteContract, ContractError> {
    RouteContract::builder(operation_id, Method::GET, path)
        .param(ParameterSpec::path("item_id", TargetType::Integer).ge(1).title("The ID of the item"))
        .param(ParameterSpec::query("needy", TargetType::String))
        .param(ParameterSpec::query("q", TargetType::String).optional())
        .param(ParameterSpec::query("short", TargetType::Boolean).default(false))
        .param(ParameterSpec::header("x_token", TargetType::String))
        .build()
}

fn check_token(state: &AppState, params: &ParamBundle) -> Result<(), HandlerError> {
    let token: String = params.get("x_token")?;
    if state.credentials.verify(&token) {
        Ok(())
    } else {
        Err(HttpError::bad_request("Invalid X-Token header").into())
    }
}

/// Returns a handler that responds with one bound parameter unchanged.
fn echo_param(
    binding: &'static str,
) -> impl Fn(&AppState, &ParamBundle) -> HandlerResult + Send + Sync + 'static {
    move |_: &AppState, params: &ParamBundle| Ok(params.value(binding)?.clone())
}

fn home(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let mut result = ModelInstance::new("Home").with("message", "hello, world!");
    let dummy = params.value("x_dummy_header")?;
    if dummy.is_truthy() {
        result.set("dummy_headers", dummy.clone());
    }
    Ok(result.into())
}

fn read_items(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let items = vec![
        ModelInstance::new("ItemRef").with("item_id", "Foo"),
        ModelInstance::new("ItemRef").with("item_id", "Bar"),
    ];
    let mut result = ModelInstance::new("Items").with("items", items);

    let q = params.value("q")?;
    if q.is_truthy() {
        result.set("q", q.clone());
    }
    result.set("q2", params.value("q2")?.clone());

    let ads_id = params.value("ads_id")?;
    if ads_id.is_truthy() {
        result.set("cookies", ModelInstance::new("Cookies").with("ads_id", ads_id.clone()));
    }
    Ok(result.into())
}

fn read_item(state: &AppState, params: &ParamBundle) -> HandlerResult {
    check_token(state, params)?;

    let item_id: i64 = params.get("item_id")?;
    let record = state
        .items
        .get(item_id)
        .ok_or_else(|| HttpError::not_found("Item not found"))?;

    let description = if params.get::<bool>("short")? {
        "desc"
    } else {
        "awesome long description"
    };

    Ok(ModelInstance::new("ReadItem")
        .with("item", record)
        .with("needy", params.value("needy")?.clone())
        .with("q", params.value("q")?.clone())
        .with("description", description)
        .into())
}

fn create_item(state: &AppState, params: &ParamBundle) -> HandlerResult {
    check_token(state, params)?;

    let item: ModelInstance = params.get("item")?;
    if let Some(BoundValue::Int(id)) = item.get("id") {
        if state.items.contains(*id) {
            return Err(HttpError::bad_request("Item already exists").into());
        }
    }
    Ok(item.into())
}

fn update_item(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let mut result = ModelInstance::new("UpdateItem")
        .with("id", params.value("item_id")?.clone())
        .with("importance", params.value("importance")?.clone())
        .with("item", params.value("item")?.clone());

    let user = params.value("user")?;
    if user.is_truthy() {
        result.set("user", user.clone());
    }
    let q = params.value("q")?;
    if q.is_truthy() {
        result.set("q", q.clone());
    }
    Ok(result.into())
}

fn get_model(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let name: String = params.get("model_name")?;
    let message = match name.as_str() {
        "alexnet" => "Deep Learning FTW!",
        "lenet" => "LeCNN all the images",
        _ => "Have some residuals",
    };
    Ok(ModelInstance::new("ModelInfo")
        .with("model_name", params.value("model_name")?.clone())
        .with("message", message)
        .into())
}

fn create_event(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let start: Option<DateTime<FixedOffset>> = params.get("start_datetime")?;
    let end: Option<DateTime<FixedOffset>> = params.get("end_datetime")?;
    let process_after: Option<TimeDelta> = params.get("process_after")?;

    let duration = match (start, end, process_after) {
        (Some(start), Some(end), Some(after)) => {
            let begin = start.checked_add_signed(after).ok_or_else(|| {
                HandlerError::internal("start_datetime + process_after is out of range")
            })?;
            BoundValue::Duration(end.signed_duration_since(begin))
        }
        _ => BoundValue::Null,
    };

    let mut result = ModelInstance::new("Event");
    for field in [
        "event_id",
        "start_datetime",
        "end_datetime",
        "repeat_at",
        "process_after",
    ] {
        result.set(field, params.value(field)?.clone());
    }
    result.set("duration", duration);
    Ok(result.into())
}

fn create_upload(_: &AppState, params: &ParamBundle) -> HandlerResult {
    let file: UploadedFile = params.get("file")?;
    let size = i64::try_from(file.size()).map_err(|e| HandlerError::internal(e.to_string()))?;

    Ok(ModelInstance::new("Upload")
        .with("filename", file.file_name().map(str::to_string))
        .with("content_type", file.content_type().map(str::to_string))
        .with("size", size)
        .with("description", params.value("description")?.clone())
        .into())
}

//! Cart route handlers.
//!
//! The cart lives in the tower-sessions session under the configured key.
//! Each handler binds a [`Cart`] to the request's session, runs one
//! operation, and either renders or redirects back to `/cart`.

use std::collections::HashSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use cartwheel_core::{Cart, Catalog, EnrichedLineItem, LineItem, Price, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Largest quantity accepted from the add/update form.
pub const MAX_QUANTITY: u32 = 20;

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub in_stock: bool,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// A stored line whose product has left the catalog.
#[derive(Debug, Clone)]
pub struct UnavailableItemView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub unavailable: Vec<UnavailableItemView>,
    pub total: String,
    pub item_count: u64,
    pub max_quantity: u32,
}

impl CartView {
    /// Build the view from enumerated items plus the stored lines.
    ///
    /// Stored lines with no enumerated item are listed as unavailable so the
    /// displayed lines always add up to `total`.
    #[must_use]
    pub fn new<'a>(
        items: impl IntoIterator<Item = EnrichedLineItem>,
        stored: impl IntoIterator<Item = (ProductId, &'a LineItem)>,
        total: Price,
        item_count: u64,
    ) -> Self {
        let items: Vec<CartItemView> = items.into_iter().map(CartItemView::from).collect();
        let shown: HashSet<ProductId> = items.iter().map(|item| item.product_id).collect();

        let mut unavailable: Vec<UnavailableItemView> = stored
            .into_iter()
            .filter(|(id, _)| !shown.contains(id))
            .map(|(product_id, line)| UnavailableItemView {
                product_id,
                quantity: line.quantity,
                price: line.unit_price.display(),
                line_price: line.total_price().display(),
            })
            .collect();
        unavailable.sort_by_key(|item| item.product_id);

        Self {
            items,
            unavailable,
            total: total.display(),
            item_count,
            max_quantity: MAX_QUANTITY,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.unavailable.is_empty()
    }
}

impl From<EnrichedLineItem> for CartItemView {
    fn from(item: EnrichedLineItem) -> Self {
        Self {
            product_id: item.product.id,
            name: item.product.name,
            slug: item.product.slug,
            in_stock: item.product.available,
            quantity: item.quantity,
            price: item.unit_price.display(),
            line_price: item.total_price.display(),
        }
    }
}

/// Add to cart form data.
///
/// `update` replaces the line's quantity instead of adding to it.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<u32>,
    #[serde(default)]
    pub update: bool,
}

impl AddToCartForm {
    /// The requested quantity (default 1).
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the quantity is outside `1..=MAX_QUANTITY`.
    pub fn quantity(&self) -> Result<u32> {
        let quantity = self.quantity.unwrap_or(1);
        if (1..=MAX_QUANTITY).contains(&quantity) {
            Ok(quantity)
        } else {
            Err(AppError::BadRequest(format!(
                "quantity must be between 1 and {MAX_QUANTITY}"
            )))
        }
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Bind a cart to the request's session.
async fn open_cart(state: &AppState, session: Session) -> Result<Cart<Session>> {
    Ok(Cart::bind_with_key(session, state.cart_session_key()).await?)
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = open_cart(&state, session).await?;
    let items = cart.items(&state.catalog()).await?;

    let view = CartView::new(items, cart.store().iter(), cart.total_price(), cart.count());
    if !view.unavailable.is_empty() {
        tracing::info!(
            unavailable = view.unavailable.len(),
            "cart contains products no longer in the catalog"
        );
    }

    Ok(CartShowTemplate { cart: view })
}

/// Add a product to the cart, or set its quantity when `update` is set.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let quantity = form.quantity()?;

    let product = state
        .catalog()
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut cart = open_cart(&state, session).await?;
    cart.add(&product, quantity, form.update).await?;

    add_breadcrumb(
        "cart",
        if form.update {
            "Updated cart quantity"
        } else {
            "Added to cart"
        },
        &[
            ("product_id", product_id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart.
///
/// Does not consult the catalog, so lines for deleted products can still be
/// removed.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    session: Session,
) -> Result<Redirect> {
    let mut cart = open_cart(&state, session).await?;
    cart.remove(product_id).await?;

    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let mut cart = open_cart(&state, session).await?;
    cart.clear().await?;

    Ok(Redirect::to("/cart"))
}

/// Cart count badge fragment.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = open_cart(&state, session).await?;
    Ok(CartCountTemplate {
        count: cart.count(),
    })
}

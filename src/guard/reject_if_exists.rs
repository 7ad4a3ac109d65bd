use super::{Guard, GuardResult};
use crate::context::RequestContext;
use crate::error::GuardError;
use async_trait::async_trait;
use std::sync::Arc;
use store::{Collection, Filter};

/// Field that identifies a product independently of its storage id.
pub const PRODUCT_KEY: &str = "name";

/// Rejects product creation when a product with the same name exists.
///
/// Best-effort: the lookup and the later insert are separate operations.
pub struct RejectIfExists {
    products: Arc<dyn Collection>,
}

impl RejectIfExists {
    pub fn new(products: Arc<dyn Collection>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl Guard for RejectIfExists {
    fn name(&self) -> &'static str {
        "reject_if_exists"
    }

    async fn check(&self, ctx: &mut RequestContext) -> GuardResult {
        let Some(name) = ctx.body_str(PRODUCT_KEY) else {
            return GuardResult::Proceed;
        };

        match self
            .products
            .find_one(&Filter::all().eq(PRODUCT_KEY, name))
            .await
        {
            Ok(Some(_)) => GuardError::already_exists().into(),
            Ok(None) => GuardResult::Proceed,
            Err(err) => {
                tracing::error!(collection = self.products.name(), error = %err, "existence check failed");
                GuardError::internal().into()
            }
        }
    }
}

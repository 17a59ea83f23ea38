//! Request decoding shared by the handler groups.

use moneyflow_business::BusinessError;
use moneyflow_core::{roles, ApiError, ApiResult, Claims, RequestContext};
use moneyflow_middleware::Request;
use serde::de::DeserializeOwned;

/// Decodes the JSON body of `request`.
pub(crate) fn decode<T: DeserializeOwned>(request: &Request) -> ApiResult<T> {
    serde_json::from_slice(request.body())
        .map_err(|err| ApiError::bad_request(format!("unable to decode payload: {err}")))
}

/// Returns the path parameter `name`.
///
/// Routes only bind handlers to templates carrying their parameters, so a
/// missing one is a registration bug.
pub(crate) fn param<'a>(ctx: &'a RequestContext, name: &str) -> ApiResult<&'a str> {
    ctx.param(name)
        .ok_or_else(|| ApiError::internal(format!("route has no :{name} parameter")))
}

/// Reads the `:page` and `:rows` parameters. Both must be positive.
pub(crate) fn paging(ctx: &RequestContext) -> ApiResult<(usize, usize)> {
    Ok((positive(ctx, "page")?, positive(ctx, "rows")?))
}

fn positive(ctx: &RequestContext, name: &str) -> ApiResult<usize> {
    match param(ctx, name)?.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ApiError::invalid_field(
            name,
            format!("{name} must be a positive integer"),
        )),
    }
}

/// Admits admins and the owner of `owner_id`.
pub(crate) fn require_owner_or_admin(ctx: &RequestContext, owner_id: &str) -> ApiResult<()> {
    Ok(owner_or_admin(ctx.require_claims()?, owner_id)?)
}

/// The same rule as a business check, for ownership decided inside a
/// transaction.
pub(crate) fn owner_or_admin(claims: &Claims, owner_id: &str) -> Result<(), BusinessError> {
    if claims.authorizes(roles::ADMIN, owner_id) {
        Ok(())
    } else {
        Err(BusinessError::Denied)
    }
}

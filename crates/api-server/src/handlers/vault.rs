//! Vault handlers: delegate signer registration.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::{required, required_address};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AddSignerQuery {
    /// Vault owner the signer acts for.
    pub owner_address: Option<String>,
    /// Delegate key being registered.
    pub signer_address: Option<String>,
    /// The signer's signature over `addvaultsigner:<lowercase owner>`.
    pub signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSignerResponse {
    pub owner_address: String,
    pub signer_address: String,
}

/// Register a delegate signer for a vault owner. Re-registering a signer
/// moves it to the new owner.
#[utoipa::path(
    post,
    path = "/vault/addsigner",
    tag = "vault",
    params(AddSignerQuery),
    responses(
        (status = 200, description = "Signer registered", body = AddSignerResponse),
        (status = 400, description = "Bad signature", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_signer(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AddSignerQuery>, QueryRejection>,
) -> ApiResult<Json<AddSignerResponse>> {
    let Query(query) = query?;
    let owner = required_address("ownerAddress", &query.owner_address)?;
    let signer = required_address("signerAddress", &query.signer_address)?;
    let signature = required("signature", &query.signature)?;

    state
        .delegations
        .register_delegate(&owner, &signer, signature)
        .await?;

    Ok(Json(AddSignerResponse {
        owner_address: format!("{owner:#x}"),
        signer_address: format!("{signer:#x}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{app, send};
    use auth::RelayWallet;
    use axum::http::{Method, StatusCode};
    use relay_core::signing::add_signer_message;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_with_post_and_patch() {
        let (router, state) = app();
        let owner = RelayWallet::random().address();
        let delegate = RelayWallet::random();
        let signature = delegate
            .sign_message_hex(add_signer_message(&owner).as_bytes())
            .await
            .unwrap();

        let uri = format!(
            "/vault/addsigner?ownerAddress={owner}&signerAddress={}&signature={signature}",
            delegate.address()
        );
        for method in [Method::POST, Method::PATCH] {
            let (status, _) = send(&router, method, &uri, None).await;
            assert_eq!(status, StatusCode::OK);
        }
        assert!(state
            .delegations
            .resolve(&delegate.address(), &owner)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_signature_from_other_key_rejected() {
        let (router, _state) = app();
        let owner = RelayWallet::random().address();
        let impostor = RelayWallet::random();
        let signature = impostor
            .sign_message_hex(add_signer_message(&owner).as_bytes())
            .await
            .unwrap();

        let uri = format!(
            "/vault/addsigner?ownerAddress={owner}&signerAddress={}&signature={signature}",
            RelayWallet::random().address()
        );
        let (status, err) = send(&router, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err, json!({ "err": "bad signature" }));

        let (_, err) = send(&router, Method::POST, "/vault/addsigner", None).await;
        assert_eq!(err["err"], json!("Missing ownerAddress"));
    }
}

//! Mini-app requests
//!
//! The mini-app posts JSON through `web_app_data`. The sender is always the
//! acting user, whatever ids the payload carries. Every request produces a
//! JSON response; failures become `{ success: false, error: { kind, message } }`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::handlers::{is_user_facing, BotContext};
use crate::i18n::{params, I18n};
use crate::models::{
    LikeKind, LikeResult, LikesBetween, LikesInfo, Profile, ProfileSubmission, ProfileSummary, QuotaKind,
    UpdatePreferencesRequest,
};
use crate::services::{PurchaseResult, RecommendationFilters};
use crate::utils::errors::{ErrorKind, Result, TeamderError};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum WebAppRequest {
    #[serde(rename_all = "camelCase")]
    Like { to_telegram_id: i64 },
    #[serde(rename_all = "camelCase")]
    SuperLike { to_telegram_id: i64 },
    #[serde(rename_all = "camelCase")]
    Dislike { to_telegram_id: i64 },
    Recommendations {
        #[serde(default)]
        filters: RecommendationFilters,
    },
    LikesInfo,
    #[serde(rename_all = "camelCase")]
    LikesBetween { other_telegram_id: i64 },
    #[serde(rename_all = "camelCase")]
    Purchase {
        kind: QuotaKind,
        amount: u32,
        stars_cost: i64,
    },
    #[serde(rename_all = "camelCase")]
    PurchasePackage { package_id: String },
    SubmitProfile { profile: ProfileSubmission },
    UpdatePreferences { preferences: UpdatePreferencesRequest },
    DeleteProfile,
    CreateTopUp { amount: i64 },
}

impl WebAppRequest {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    fn is_swipe(&self) -> bool {
        matches!(
            self,
            WebAppRequest::Like { .. } | WebAppRequest::SuperLike { .. } | WebAppRequest::Dislike { .. }
        )
    }
}

/// Like / super-like response; only the allowance that was spent is reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_likes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_super_likes: Option<u32>,
    pub is_mutual: bool,
}

impl From<&LikeResult> for LikeResponse {
    fn from(result: &LikeResult) -> Self {
        let (remaining_likes, remaining_super_likes) = match result.kind {
            LikeKind::Regular => (Some(result.remaining), None),
            LikeKind::Super => (None, Some(result.remaining)),
        };
        Self {
            success: result.success,
            remaining_likes,
            remaining_super_likes,
            is_mutual: result.is_mutual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WebAppResponse {
    Like(LikeResponse),
    Dislike {
        success: bool,
        removed: bool,
    },
    Recommendations(Vec<ProfileSummary>),
    LikesInfo(LikesInfo),
    LikesBetween(LikesBetween),
    Purchase(PurchaseResult),
    ProfileSubmitted {
        success: bool,
        profile: Profile,
    },
    PreferencesUpdated {
        success: bool,
        profile: Profile,
    },
    ProfileDeleted {
        success: bool,
    },
    #[serde(rename_all = "camelCase")]
    TopUp {
        success: bool,
        payment_id: Uuid,
        amount: i64,
    },
    Error {
        success: bool,
        error: ErrorBody,
    },
}

impl WebAppResponse {
    pub fn error(error: &TeamderError) -> Self {
        WebAppResponse::Error {
            success: false,
            error: ErrorBody {
                kind: error.kind(),
                message: error.user_message(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, WebAppResponse::Error { .. })
    }
}

/// Run one mini-app request for `user_id`
pub async fn respond(ctx: &BotContext, user_id: i64, request: WebAppRequest) -> WebAppResponse {
    match execute(ctx, user_id, request).await {
        Ok(response) => response,
        Err(e) => {
            if is_user_facing(&e) {
                debug!(user_id = user_id, error = %e, "Web app request rejected");
            } else {
                warn!(
                    user_id = user_id,
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Web app request failed"
                );
            }
            WebAppResponse::error(&e)
        }
    }
}

async fn execute(ctx: &BotContext, user_id: i64, request: WebAppRequest) -> Result<WebAppResponse> {
    if request.is_swipe() {
        ctx.rate_limit.check_swipe(user_id).await?;
    }
    let services = &ctx.services;

    let response = match request {
        WebAppRequest::Like { to_telegram_id } => {
            let result = services.ledger.like(user_id, to_telegram_id).await?;
            WebAppResponse::Like(LikeResponse::from(&result))
        }
        WebAppRequest::SuperLike { to_telegram_id } => {
            let result = services.ledger.super_like(user_id, to_telegram_id).await?;
            WebAppResponse::Like(LikeResponse::from(&result))
        }
        WebAppRequest::Dislike { to_telegram_id } => {
            let removed = services.ledger.dislike(user_id, to_telegram_id).await?;
            WebAppResponse::Dislike { success: true, removed }
        }
        WebAppRequest::Recommendations { filters } => {
            WebAppResponse::Recommendations(services.recommendation_service.recommend(user_id, &filters).await?)
        }
        WebAppRequest::LikesInfo => WebAppResponse::LikesInfo(services.profile_service.likes_info(user_id).await?),
        WebAppRequest::LikesBetween { other_telegram_id } => {
            WebAppResponse::LikesBetween(services.ledger.likes_between(user_id, other_telegram_id).await?)
        }
        WebAppRequest::Purchase {
            kind,
            amount,
            stars_cost,
        } => WebAppResponse::Purchase(
            services
                .currency_service
                .purchase_extra(user_id, kind, amount, stars_cost)
                .await?,
        ),
        WebAppRequest::PurchasePackage { package_id } => {
            WebAppResponse::Purchase(services.currency_service.purchase_package(user_id, &package_id).await?)
        }
        WebAppRequest::SubmitProfile { profile } => WebAppResponse::ProfileSubmitted {
            success: true,
            profile: services.profile_service.submit_profile(user_id, profile).await?,
        },
        WebAppRequest::UpdatePreferences { preferences } => WebAppResponse::PreferencesUpdated {
            success: true,
            profile: services.profile_service.update_preferences(user_id, preferences).await?,
        },
        WebAppRequest::DeleteProfile => {
            let reason = ctx.i18n().t("bot.delete_reason", &ctx.language_of(user_id).await, None);
            services.profile_service.delete_profile(user_id, &reason).await?;
            WebAppResponse::ProfileDeleted { success: true }
        }
        WebAppRequest::CreateTopUp { amount } => {
            let payments = services
                .payment_service
                .as_ref()
                .ok_or_else(|| TeamderError::Config("Payments are not configured".to_string()))?;
            let payment = payments.create_top_up(user_id, amount).await?;
            WebAppResponse::TopUp {
                success: true,
                payment_id: payment.id,
                amount: payment.amount,
            }
        }
    };

    Ok(response)
}

/// Chat text for a response; `None` when a notification already covers it
pub fn render(i18n: &I18n, lang: &str, response: &WebAppResponse) -> Option<String> {
    let text = match response {
        WebAppResponse::Like(like) => match (like.remaining_likes, like.remaining_super_likes) {
            (Some(remaining), _) => i18n.tp("bot.like_sent", lang, i64::from(remaining), None),
            (None, Some(remaining)) => i18n.tp("bot.super_like_sent", lang, i64::from(remaining), None),
            (None, None) => return None,
        },
        WebAppResponse::Dislike { .. } => i18n.t("bot.skipped", lang, None),
        WebAppResponse::Recommendations(candidates) => i18n.t(
            "bot.recommendations_found",
            lang,
            Some(&params([("count", candidates.len().to_string())])),
        ),
        WebAppResponse::LikesInfo(info) => i18n.t(
            "bot.quota_line",
            lang,
            Some(&params([
                ("likes", format!("{}/{}", info.likes.remaining, info.likes.total_available)),
                (
                    "super_likes",
                    format!("{}/{}", info.super_likes.remaining, info.super_likes.total_available),
                ),
            ])),
        ),
        WebAppResponse::LikesBetween(between) => i18n.t(
            "bot.likes_between",
            lang,
            Some(&params([
                ("given", yes_no(between.a_liked_b)),
                ("received", yes_no(between.b_liked_a)),
            ])),
        ),
        WebAppResponse::Purchase(result) => i18n.t(
            "bot.purchase_done",
            lang,
            Some(&params([
                ("stars", result.remaining_stars.to_string()),
                ("total", result.total_available.to_string()),
                ("kind", crate::handlers::commands::store::kind_label(i18n, lang, result.kind)),
            ])),
        ),
        WebAppResponse::ProfileSubmitted { .. } => return None,
        WebAppResponse::PreferencesUpdated { .. } => i18n.t("bot.preferences_updated", lang, None),
        WebAppResponse::ProfileDeleted { .. } => return None,
        WebAppResponse::TopUp { amount, .. } => {
            i18n.t("bot.topup_created", lang, Some(&params([("amount", amount.to_string())])))
        }
        WebAppResponse::Error { error, .. } => i18n.t(
            "bot.error",
            lang,
            Some(&params([("message", crate::utils::helpers::escape_html(&error.message))])),
        ),
    };
    Some(text)
}

fn yes_no(value: bool) -> String {
    if value { "✅" } else { "—" }.to_string()
}

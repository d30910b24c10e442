mod helpers;

use helpers::{FailingGateway, TestApp};
use prompip_backend::error::AppError;
use prompip_backend::repositories::{LicenseStore, PromptStore};
use prompip_backend::services::prompt_service::CreatePromptInput;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Verification ledger and score recalculation
// ============================================================================

#[tokio::test]
async fn test_first_useful_verification() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Summarizer").await;

    let outcome = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, true, Some("Worked well".to_string()))
        .await
        .unwrap();

    assert!(outcome.verification.is_useful);
    assert_eq!(outcome.prompt.trust_score, 100.0);
    assert_eq!(outcome.prompt.effectiveness_score, 100.0);
    assert_eq!(outcome.prompt.verification_count, 1);
    // Not anchored on-chain, so no license is minted
    assert!(outcome.license.is_none());

    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 10);
}

#[tokio::test]
async fn test_scores_weight_by_verifier_reputation() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let novice = app.user("0xnovice").await;
    let expert = app.user_with_reputation("0xexpert", 9).await;
    let prompt = app.prompt(creator.id, "Classifier").await;

    app.state
        .verification_service
        .submit_verification(prompt.id, novice.id, true, None)
        .await
        .unwrap();

    let outcome = app
        .state
        .verification_service
        .submit_verification(prompt.id, expert.id, false, None)
        .await
        .unwrap();

    // Trust is the raw useful ratio; effectiveness weights the expert's
    // negative judgment ten times the novice's positive one.
    assert_eq!(outcome.prompt.trust_score, 50.0);
    assert_eq!(outcome.prompt.effectiveness_score, 9.09);
    assert_eq!(outcome.prompt.verification_count, 2);

    // Only the positive verification paid out
    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 10);
}

#[tokio::test]
async fn test_duplicate_verification_rejected() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Translator").await;

    app.state
        .verification_service
        .submit_verification(prompt.id, verifier.id, true, None)
        .await
        .unwrap();

    // A changed judgment does not get a second row
    let err = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Scores and reputation are untouched by the rejected submission
    let prompt = app.reload_prompt(prompt.id).await.expect("prompt exists");
    assert_eq!(prompt.trust_score, 100.0);
    assert_eq!(prompt.verification_count, 1);

    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 10);
}

#[tokio::test]
async fn test_concurrent_duplicate_submissions_land_once() {
    let app = Arc::new(TestApp::new());
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Contended").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        let prompt_id = prompt.id;
        let verifier_id = verifier.id;
        handles.push(tokio::spawn(async move {
            app.state
                .verification_service
                .submit_verification(prompt_id, verifier_id, true, None)
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => successes += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    // The store-level uniqueness guarantee decides the race: exactly one
    // submission lands no matter the interleaving.
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);

    let prompt = app.reload_prompt(prompt.id).await.expect("prompt exists");
    assert_eq!(prompt.verification_count, 1);
    assert_eq!(prompt.trust_score, 100.0);

    // One row, one award
    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 10);
}

#[tokio::test]
async fn test_failed_reputation_award_is_internal_error() {
    let app = TestApp::with_broken_reputation();
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Fragile").await;

    // The creator existed when the prompt loaded, so a failing award is an
    // internal consistency error, not a caller mistake.
    let err = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Message(_)));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_self_verification_forbidden() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let prompt = app.prompt(creator.id, "Debugger").await;

    let err = app
        .state
        .verification_service
        .submit_verification(prompt.id, creator.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let prompt = app.reload_prompt(prompt.id).await.expect("prompt exists");
    assert_eq!(prompt.verification_count, 0);
}

#[tokio::test]
async fn test_verify_unknown_prompt() {
    let app = TestApp::new();
    let verifier = app.user("0xverifier").await;

    let err = app
        .state
        .verification_service
        .submit_verification(Uuid::new_v4(), verifier.id, true, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_negative_verification_awards_nothing() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Planner").await;

    let outcome = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, false, None)
        .await
        .unwrap();

    assert_eq!(outcome.prompt.trust_score, 0.0);
    assert_eq!(outcome.prompt.effectiveness_score, 0.0);

    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 0);
}

#[tokio::test]
async fn test_verification_listing_tally() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let prompt = app.prompt(creator.id, "Reviewer").await;

    for (wallet, useful) in [("0xa", true), ("0xb", true), ("0xc", false)] {
        let verifier = app.user(wallet).await;
        app.state
            .verification_service
            .submit_verification(prompt.id, verifier.id, useful, None)
            .await
            .unwrap();
    }

    let listing = app
        .state
        .verification_service
        .verifications_for_prompt(prompt.id)
        .await
        .unwrap();

    assert_eq!(listing.verifications.len(), 3);
    assert_eq!(listing.summary.useful_count, 2);
    assert_eq!(listing.summary.not_useful_count, 1);
    assert_eq!(listing.summary.total_count, 3);
    assert_eq!(listing.summary.trust_score, 66.67);
}

// ============================================================================
// Story registration and licensing
// ============================================================================

#[tokio::test]
async fn test_register_and_license_flow() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Anchored").await;

    let registration = app
        .state
        .prompt_service
        .register_on_chain(prompt.id, creator.id)
        .await
        .unwrap();
    assert!(registration.prompt.story_ip_id.is_some());
    assert_eq!(registration.reputation_snapshot.verification_count, 0);

    // Registering twice is rejected
    let err = app
        .state
        .prompt_service
        .register_on_chain(prompt.id, creator.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Verifying an anchored prompt mints a license for the verifier
    let outcome = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, true, None)
        .await
        .unwrap();
    let license = outcome.license.expect("license minted in simulation mode");
    assert!(license.license_token_id.starts_with("sim-license-"));

    assert!(app
        .store
        .exists_for_buyer(prompt.id, verifier.id)
        .await
        .unwrap());

    // The license grants access to the prompt text
    let detail = app
        .state
        .prompt_service
        .get_prompt(prompt.id, Some(verifier.id))
        .await
        .unwrap();
    assert!(!detail.locked);
    assert!(detail.prompt_text.is_some());
}

#[tokio::test]
async fn test_license_failure_keeps_verification() {
    let app = TestApp::with_gateway(Arc::new(FailingGateway));
    let creator = app.user("0xcreator").await;
    let verifier = app.user("0xverifier").await;
    let prompt = app.prompt(creator.id, "Flaky").await;

    // Anchor directly, bypassing the unreachable gateway
    app.store
        .set_story_anchor(prompt.id, "ip-1", "terms-1")
        .await
        .unwrap();

    let outcome = app
        .state
        .verification_service
        .submit_verification(prompt.id, verifier.id, true, None)
        .await
        .unwrap();

    // The verification is durable even though minting failed
    assert!(outcome.license.is_none());
    assert_eq!(outcome.prompt.verification_count, 1);

    let creator = app.reload_user(creator.id).await;
    assert_eq!(creator.reputation_points, 10);
}

#[tokio::test]
async fn test_register_requires_creator() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let other = app.user("0xother").await;
    let prompt = app.prompt(creator.id, "Owned").await;

    let err = app
        .state
        .prompt_service
        .register_on_chain(prompt.id, other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

// ============================================================================
// Prompt lifecycle
// ============================================================================

#[tokio::test]
async fn test_prompt_access_control() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let stranger = app.user("0xstranger").await;
    let prompt = app.prompt(creator.id, "Secret").await;

    let own = app
        .state
        .prompt_service
        .get_prompt(prompt.id, Some(creator.id))
        .await
        .unwrap();
    assert!(!own.locked);
    assert!(own.prompt_text.is_some());

    let viewed = app
        .state
        .prompt_service
        .get_prompt(prompt.id, Some(stranger.id))
        .await
        .unwrap();
    assert!(viewed.locked);
    assert!(viewed.prompt_text.is_none());

    let anonymous = app
        .state
        .prompt_service
        .get_prompt(prompt.id, None)
        .await
        .unwrap();
    assert!(anonymous.locked);
}

#[tokio::test]
async fn test_delete_rules() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let other = app.user("0xother").await;
    let prompt = app.prompt(creator.id, "Disposable").await;

    let err = app
        .state
        .prompt_service
        .delete_prompt(prompt.id, other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Anchored prompts are immutable records
    let anchored = app.prompt(creator.id, "Anchored").await;
    app.state
        .prompt_service
        .register_on_chain(anchored.id, creator.id)
        .await
        .unwrap();
    let err = app
        .state
        .prompt_service
        .delete_prompt(anchored.id, creator.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    app.state
        .prompt_service
        .delete_prompt(prompt.id, creator.id)
        .await
        .unwrap();
    assert!(app.reload_prompt(prompt.id).await.is_none());
}

#[tokio::test]
async fn test_remix_requires_existing_parent() {
    let app = TestApp::new();
    let creator = app.user("0xcreator").await;
    let parent = app.prompt(creator.id, "Original").await;

    let remix = app
        .state
        .prompt_service
        .create_prompt(
            creator.id,
            CreatePromptInput {
                title: "Remix".to_string(),
                description: "Derived".to_string(),
                prompt_text: "Remixed text".to_string(),
                category: "writing".to_string(),
                license_type: Some("COMMERCIAL".to_string()),
                parent_prompt_id: Some(parent.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(remix.parent_prompt_id, Some(parent.id));
    assert_eq!(remix.license_type, "COMMERCIAL");

    let err = app
        .state
        .prompt_service
        .create_prompt(
            creator.id,
            CreatePromptInput {
                title: "Orphan".to_string(),
                description: "Derived".to_string(),
                prompt_text: "text".to_string(),
                category: "writing".to_string(),
                license_type: None,
                parent_prompt_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Leaderboards
// ============================================================================

#[tokio::test]
async fn test_leaderboards() {
    let app = TestApp::new();
    let alice = app.user("0xalice").await;
    let bob = app.user("0xbob").await;

    let popular = app.prompt(alice.id, "Popular").await;
    let niche = app.prompt(bob.id, "Niche").await;

    // Three useful verifications for Alice's prompt, one for Bob's
    for wallet in ["0xv1", "0xv2", "0xv3"] {
        let verifier = app.user(wallet).await;
        app.state
            .verification_service
            .submit_verification(popular.id, verifier.id, true, None)
            .await
            .unwrap();
    }
    let verifier = app.user("0xv1").await;
    app.state
        .verification_service
        .submit_verification(niche.id, verifier.id, true, None)
        .await
        .unwrap();

    let creators = app.state.leaderboard_service.top_creators(10).await.unwrap();
    assert_eq!(creators[0].id, alice.id);
    assert_eq!(creators[0].reputation_points, 30);
    assert_eq!(creators[0].prompt_count, 1);
    assert_eq!(creators[1].id, bob.id);
    assert_eq!(creators[1].reputation_points, 10);

    // The useful board hides prompts under the verification floor
    let useful = app
        .state
        .leaderboard_service
        .most_useful_prompts(10, 3)
        .await
        .unwrap();
    assert_eq!(useful.len(), 1);
    assert_eq!(useful[0].prompt.id, popular.id);

    let verified = app
        .state
        .leaderboard_service
        .most_verified_prompts(10)
        .await
        .unwrap();
    assert_eq!(verified.len(), 2);
    assert_eq!(verified[0].prompt.id, popular.id);
    assert_eq!(verified[1].prompt.id, niche.id);
}

#[tokio::test]
async fn test_negative_leaderboard_limits_clamp_to_zero() {
    let app = TestApp::new();
    let alice = app.user("0xalice").await;
    app.prompt(alice.id, "One").await;

    let creators = app
        .state
        .leaderboard_service
        .top_creators(-5)
        .await
        .unwrap();
    assert!(creators.is_empty());

    let useful = app
        .state
        .leaderboard_service
        .most_useful_prompts(-1, -1)
        .await
        .unwrap();
    assert!(useful.is_empty());

    let verified = app
        .state
        .leaderboard_service
        .most_verified_prompts(-3)
        .await
        .unwrap();
    assert!(verified.is_empty());
}

// ============================================================================
// Accounts and nicknames
// ============================================================================

#[tokio::test]
async fn test_wallet_auth_is_idempotent() {
    let app = TestApp::new();
    let first = app.user("0xwallet").await;
    let second = app.user("0xwallet").await;
    assert_eq!(first.id, second.id);

    let err = app
        .state
        .account_service
        .authenticate("  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_nickname_set_once() {
    let app = TestApp::new();
    let alice = app.user("0xalice").await;
    let bob = app.user("0xbob").await;

    let updated = app
        .state
        .account_service
        .set_nickname(alice.id, "alice1")
        .await
        .unwrap();
    assert_eq!(updated.nickname.as_deref(), Some("alice1"));

    // Immutable once set
    let err = app
        .state
        .account_service
        .set_nickname(alice.id, "alice2")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Unique across users
    let err = app
        .state
        .account_service
        .set_nickname(bob.id, "alice1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert!(!app
        .state
        .account_service
        .nickname_available("alice1")
        .await
        .unwrap());
    assert!(app
        .state
        .account_service
        .nickname_available("bob42")
        .await
        .unwrap());
    // Invalid names are reported unavailable rather than erroring
    assert!(!app
        .state
        .account_service
        .nickname_available("no spaces")
        .await
        .unwrap());
}

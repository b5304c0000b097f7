mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use zoning_api::types::Role;

#[tokio::test]
async fn property_with_two_uses_aggregates() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;

    let (status, body) = app
        .post(
            "/api/properties",
            Some(&token),
            json!({
                "address": "1 Main St",
                "apn": "APN1",
                "pincode": "94103",
                "zoning": "R1",
                "plot_area_sqft": 5000,
                "height_limit_ft": 30,
                "depth_ft": 100,
                "width_ft": 50,
                "building_sqft": 2000
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let property_id = body["property_id"]
        .as_i64()
        .ok_or_else(|| anyhow::anyhow!("no property_id in {}", body))?;

    let (status, body) = app
        .post(
            "/api/permitted-uses",
            Some(&token),
            json!({
                "property_id": property_id,
                "uses": [
                    { "use_type": "Single-Family", "lot_area_sqft": 5000, "max_height_ft": 30 },
                    { "use_type": "Garage", "lot_area_sqft": "600" }
                ]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["use_ids"].as_array().map(Vec::len), Some(2));

    let (status, detail) = app.get(&format!("/api/property/{}", property_id), Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["property_id"], property_id);
    assert_eq!(detail["address"], "1 Main St");
    assert_eq!(detail["plot_area_sqft"], 5000.0);
    assert_eq!(detail["building_sqft"], 2000.0);

    let uses = detail["permitted_uses"]
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("permitted_uses is not an object"))?;
    let mut keys: Vec<&str> = uses.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["Garage", "Single-Family"]);
    assert_eq!(uses["Single-Family"]["max_height_ft"], 30.0);
    assert_eq!(uses["Garage"]["lot_area_sqft"], 600.0);

    // Nothing else submitted yet
    assert_eq!(detail["adu_details"], json!({}));
    assert_eq!(detail["jadu_details"], json!({}));
    assert!(detail["parking_requirement"].is_null());
    Ok(())
}

#[tokio::test]
async fn missing_property_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;

    let (status, _) = app.get("/api/property/999", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.get("/api/property/abc", Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid ID format");
    Ok(())
}

#[tokio::test]
async fn search_matches_substrings() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;

    app.create_property(&token, json!({ "address": "12 Main St", "apn": "111" })).await?;
    app.create_property(&token, json!({ "address": "9 Oak Ave", "pincode": "94110" })).await?;

    let (status, body) = app.get("/search?query=main", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["records"][0]["address"], "12 Main St");

    let (_, body) = app.get("/search?query=9411", Some(&token)).await?;
    assert_eq!(body["records"][0]["address"], "9 Oak Ave");

    // No match is still a success
    let (status, body) = app.get("/search?query=zzz", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], json!([]));

    // LIKE wildcards are matched literally
    let (_, body) = app.get("/search?query=%25", Some(&token)).await?;
    assert_eq!(body["records"], json!([]));

    let (status, _) = app.get("/search", Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn patch_updates_only_sent_fields() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;
    let property_id = app
        .create_property(&token, json!({ "address": "12 Main St", "zoning": "R1" }))
        .await?;

    let (status, _) = app
        .patch(
            &format!("/property_update/{}", property_id),
            Some(&token),
            json!({ "zoning": "R2", "height_limit_ft": "35" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.get(&format!("/api/property/{}", property_id), Some(&token)).await?;
    assert_eq!(detail["zoning"], "R2");
    assert_eq!(detail["height_limit_ft"], 35.0);
    assert_eq!(detail["address"], "12 Main St");
    Ok(())
}

#[tokio::test]
async fn empty_patch_never_reaches_the_store() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;
    let property_id = app.create_property(&token, json!({ "address": "12 Main St" })).await?;

    let before = app.store.operation_count();
    let (status, body) = app
        .patch(&format!("/property_update/{}", property_id), Some(&token), json!({}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No update fields provided.");
    assert_eq!(app.store.operation_count(), before);
    Ok(())
}

#[tokio::test]
async fn patch_rejects_bad_fields() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;
    let property_id = app.create_property(&token, json!({ "address": "12 Main St" })).await?;
    let uri = format!("/property_update/{}", property_id);

    let (status, _) = app.patch(&uri, Some(&token), json!({ "plot_area_sqft": "lots" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.patch(&uri, Some(&token), json!(["zoning"])).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch("/property_update/999", Some(&token), json!({ "zoning": "R2" }))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn new_property_starts_the_wizard() -> Result<()> {
    let app = TestApp::new();
    let (_, token) = app.user_token("planner@example.com", Role::User).await?;
    let property_id = app.create_property(&token, json!({ "address": "12 Main St" })).await?;

    let (status, body) = app
        .get(&format!("/api/properties/{}/wizard", property_id), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_step"], "property");
    assert_eq!(body["next_step"], "setbacks");
    assert_eq!(body["complete"], false);

    let (status, _) = app.get("/api/properties/999/wizard", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

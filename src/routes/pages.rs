// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static pages.

use crate::AppState;
use axum::{response::Html, routing::get, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>YouTube Research Tool</title>
    <style>
        body {
            font-family: Arial, sans-serif;
            text-align: center;
            padding: 40px;
            background-color: #f5f5f5;
        }
        .btn {
            padding: 12px 25px;
            background-color: #ff0000;
            color: white;
            text-decoration: none;
            border-radius: 8px;
            font-weight: bold;
        }
        iframe {
            margin-top: 30px;
            border: 0;
            border-radius: 12px;
            box-shadow: 0 4px 15px rgba(0, 0, 0, 0.2);
        }
    </style>
</head>
<body>
    <h1>YouTube Subscription Research Tool</h1>

    <p>
        <a href="/login" class="btn">Connect your YouTube</a>
    </p>

    <h2>Demo Video</h2>

    <iframe width="800" height="450"
        src="https://www.youtube.com/embed/1stDRZrML5o"
        allowfullscreen>
    </iframe>
</body>
</html>
"#;

/// Landing page with the login link.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

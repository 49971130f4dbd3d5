//! Root page handler - coaching page

use axum::response::{Html, IntoResponse};

/// GET /
///
/// Renders the page shell with build info; panels are filled by coach.js
pub async fn root_page() -> impl IntoResponse {
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>BowlBetter Coach</title>
    <link rel="stylesheet" href="/static/coach.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>BowlBetter Coach</h1>
                <div class="subtitle">Approach and release feedback from your own photos</div>
                <span id="connection-status" class="connection-status">Connecting...</span>
            </div>
            <div class="header-right">
                <div class="build-info-line">v{version} [{git_hash}]</div>
                <div class="build-info-line">{build_timestamp} ({build_profile})</div>
            </div>
        </div>
        <nav>
            <button data-tab="sequence" class="active">Sequence</button>
            <button data-tab="approach">Approach</button>
            <button data-tab="release">Release</button>
            <button data-tab="tournament">Tournament</button>
            <button data-tab="equipment">Equipment</button>
            <button data-tab="ask">Ask</button>
            <button data-tab="settings">Settings</button>
        </nav>
    </header>

    <main class="container">
        <section id="tab-sequence" class="tab active">
            <h2>Video Frames</h2>
            <input type="file" id="sequence-files" accept="image/*" multiple>
            <div id="sequence-rejected" class="error"></div>
            <div class="viewer">
                <button id="frame-prev">&lt;</button>
                <img id="frame-current" alt="">
                <button id="frame-next">&gt;</button>
            </div>
            <div id="frame-counter"></div>
            <div id="assign-buttons" class="button-row"></div>
        </section>

        <section id="tab-approach" class="tab">
            <h2>Approach</h2>
            <label>Steps
                <select id="step-count">
                    <option>3</option><option selected>4</option><option>5</option><option>6</option>
                </select>
            </label>
            <input type="file" id="bulk-files" accept="image/*" multiple>
            <div id="step-grid" class="step-grid"></div>
            <button id="analyze-approach">Analyze Approach</button>
            <div id="aggregate" class="panel"></div>
        </section>

        <section id="tab-release" class="tab">
            <h2>Ball Release</h2>
            <div id="release-frame"></div>
            <button id="analyze-release">Analyze Release</button>
            <div id="release-result" class="panel"></div>
        </section>

        <section id="tab-tournament" class="tab">
            <h2>Tournament Scores</h2>
            <div id="tip" class="tip"></div>
            <form id="game-form">
                <input type="date" name="date">
                <input type="number" name="score" min="0" max="300" placeholder="Score" required>
                <input type="text" name="location" placeholder="Location">
                <input type="text" name="notes" placeholder="Notes">
                <button type="submit">Add Game</button>
            </form>
            <div id="game-stats"></div>
            <table id="games"><thead><tr>
                <th data-sort="date">Date</th><th data-sort="score">Score</th><th>Location</th><th>Notes</th><th></th>
            </tr></thead><tbody></tbody></table>
            <a href="/api/tournament/export.csv">Export CSV</a>
        </section>

        <section id="tab-equipment" class="tab">
            <h2>Ball Inventory</h2>
            <form id="ball-form">
                <input type="text" name="name" placeholder="Ball name" required>
                <input type="number" name="weight" min="6" max="16" value="15">
                <input type="text" name="cover_stock" placeholder="Cover stock">
                <input type="text" name="layout" placeholder="Layout">
                <input type="text" name="notes" placeholder="Notes">
                <button type="submit">Add Ball</button>
            </form>
            <ul id="balls"></ul>
        </section>

        <section id="tab-ask" class="tab">
            <h2>Ask the Coach</h2>
            <form id="ask-form">
                <textarea name="question" rows="3" placeholder="Your question" required></textarea>
                <textarea name="context" rows="3" placeholder="Background (optional)"></textarea>
                <input type="file" name="image" accept="image/*">
                <button type="submit">Ask</button>
            </form>
            <div id="ask-answer" class="panel"></div>
        </section>

        <section id="tab-settings" class="tab">
            <h2>Settings</h2>
            <div id="key-status"></div>
            <input type="password" id="api-key" placeholder="API key">
            <button id="save-key">Save</button>
            <button id="test-key">Test</button>
            <div id="key-test-result"></div>
            <h3>Scoring Context</h3>
            <textarea id="scoring-context" rows="8"></textarea>
            <button id="save-context">Save</button>
        </section>
    </main>

    <script src="/static/coach.js"></script>
</body>
</html>
"#,
    );

    Html(html)
}

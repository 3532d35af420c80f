use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use indoc::indoc;
use insta::assert_json_snapshot;
use tilepick::TilepickError;
use tilepick::args::ViewArgs;
use tilepick::config::{Config, read_config};
use tilepick::pick::pick;
use tilepick_core::tiles::mvt::encode_tile;
use tilepick_core::tiles::{
    Feature, GeomKind, TileError, TileFetcher, TileLayer, TileResult, VectorTile,
};
use tilepick_tile_utils::{Point, TilePosition};

const CONFIG: &str = indoc! {"
    source:
      url: https://${TILE_HOST}/{z}/{x}/{y}.pbf
    layer:
      max_native_zoom: 5
      visibility_delay: 1s
      style:
        color: '#228b22'
"};

#[derive(Debug, Default)]
struct FixtureFetcher {
    tiles: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

#[async_trait]
impl TileFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> TileResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tiles
            .get(url)
            .cloned()
            .ok_or_else(|| TileError::HttpStatusError(404, url.to_string()))
    }
}

fn park_fetcher() -> Arc<FixtureFetcher> {
    let ring = vec![
        Point::new(1024.0, 1024.0),
        Point::new(3072.0, 1024.0),
        Point::new(3072.0, 3072.0),
        Point::new(1024.0, 3072.0),
        Point::new(1024.0, 1024.0),
    ];
    let park = Feature::new(GeomKind::Polygon, vec![ring])
        .with_property("id", 42)
        .with_property("name", "Park");
    let tile = encode_tile(&VectorTile {
        layers: vec![TileLayer::new("parks", 4096).with_feature(park)],
    });
    Arc::new(FixtureFetcher {
        tiles: HashMap::from([("https://tiles.example.com/5/1/2.pbf".to_string(), tile)]),
        calls: AtomicUsize::new(0),
    })
}

fn load_config() -> Config {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tilepick.yaml");
    std::fs::write(&path, CONFIG).unwrap();
    let env = HashMap::from([("TILE_HOST", "tiles.example.com")]);
    read_config(&path, &env).unwrap()
}

fn view(zoom: Option<u8>, click: Option<Point>) -> ViewArgs {
    ViewArgs {
        tile: TilePosition::new(1, 2, 5),
        zoom,
        click,
        svg: None,
        url: None,
        tile_size: None,
    }
}

#[tokio::test(start_paused = true)]
async fn test_overzoomed_click() {
    let config = load_config();
    let fetcher = park_fetcher();

    let picked = pick(
        &config,
        &view(Some(6), Some(Point::new(256.0, 256.0))),
        fetcher.clone(),
    )
    .await
    .unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    let svg = picked.canvas.to_svg();
    assert!(svg.contains(r#"width="512""#), "{svg}");
    assert!(
        svg.contains(r#"d="M128 128 L384 128 L384 384 L128 384 L128 128 Z""#),
        "{svg}"
    );
    assert!(svg.contains(r##"stroke="#228b22""##), "{svg}");
    assert_json_snapshot!(picked.events, @r#"
    [
      {
        "event": "click",
        "properties": {
          "id": 42,
          "name": "Park"
        }
      },
      {
        "event": "moveend",
        "visible": [
          {
            "osm_id": 42,
            "name": "Park",
            "type": 3
          }
        ]
      }
    ]
    "#);
}

#[tokio::test(start_paused = true)]
async fn test_click_outside_reports_only_visible() {
    let config = load_config();
    let picked = pick(
        &config,
        &view(None, Some(Point::new(10.0, 10.0))),
        park_fetcher(),
    )
    .await
    .unwrap();

    assert_eq!(picked.events.len(), 1);
    assert_eq!(
        serde_json::to_value(&picked.events[0]).unwrap()["event"],
        "moveend"
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_tile_fails() {
    let config = load_config();
    let err = pick(
        &config,
        &ViewArgs {
            tile: TilePosition::new(3, 4, 5),
            ..view(None, None)
        },
        park_fetcher(),
    )
    .await
    .unwrap_err();

    assert!(
        matches!(&err, TilepickError::TileError(e) if matches!(e.root(), TileError::HttpStatusError(404, _))),
        "{err}"
    );
}

#[tokio::test]
async fn test_zoom_below_tile_fails() {
    let config = load_config();
    let err = pick(&config, &view(Some(4), None), park_fetcher())
        .await
        .unwrap_err();
    assert!(matches!(err, TilepickError::ZoomMismatch { .. }), "{err}");
}

#[test]
fn test_save_and_reload_config() {
    let config = load_config();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.yaml");

    config.save_to_file(&path).unwrap();
    let env: HashMap<&str, &str> = HashMap::new();
    let reloaded = read_config(&path, &env).unwrap();

    assert_eq!(reloaded, config);
}

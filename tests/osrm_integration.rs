use std::env;

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::ReuseDirective;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use shadewalk::osrm::{OsrmClient, OsrmConfig};
use shadewalk::osrm_data::{GeofabrikRegion, OsrmDataset, OsrmDatasetConfig};
use shadewalk::traits::PathProvider;
use shadewalk::types::GeoPoint;

fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_root = env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string());
    let region = GeofabrikRegion::new("europe/monaco");
    let config = OsrmDatasetConfig::new(region, data_root);
    let dataset = OsrmDataset::ensure(&config)
        .map_err(|err| TestcontainersError::other(format!("OSRM prep failed: {:?}", err)))?;
    let mtime = std::fs::metadata(dataset.osrm_base.with_extension("osrm.partition"))
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(std::time::SystemTime::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    let container_name = format!("osrm-monaco-foot-mld-{}", mtime);

    let image = GenericImage::new("osrm/osrm-backend", "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(
            dataset.data_dir.to_string_lossy().to_string(),
            "/data",
        ))
        .with_cmd(vec![
            "osrm-routed",
            "--algorithm",
            "mld",
            "/data/monaco-latest.osrm",
        ])
        .with_container_name(container_name)
        .with_startup_timeout(std::time::Duration::from_secs(30))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    let base_url = format!("http://127.0.0.1:{}", port);

    Ok((container, base_url))
}

#[test]
fn osrm_route_returns_walkable_geometry() {
    let (container, base_url) = osrm_container().expect("start OSRM container");

    let config = OsrmConfig {
        base_url: base_url.clone(),
        profile: "foot".to_string(),
        timeout_secs: 10,
    };
    let client = OsrmClient::new(config).expect("build OSRM client");

    // Monte Carlo casino down to the port, roughly 700 m on foot.
    let start = GeoPoint::new(43.7396, 7.4272);
    let end = GeoPoint::new(43.7350, 7.4206);

    let path = {
        let begun = std::time::Instant::now();
        let mut last = client.path(start, end, &[]);
        while last.is_err() && begun.elapsed() < std::time::Duration::from_secs(15) {
            std::thread::sleep(std::time::Duration::from_millis(500));
            last = client.path(start, end, &[]);
        }
        last
    };

    let path = match path {
        Ok(path) => path,
        Err(err) => {
            if let Ok(stderr) = container.stderr_to_vec() {
                if !stderr.is_empty() {
                    eprintln!("OSRM stderr:\n{}", String::from_utf8_lossy(&stderr));
                }
            }
            panic!("OSRM route failed: {}", err);
        }
    };

    assert!(path.points.len() >= 2);
    assert!(path.distance_m > 100.0);
    assert!(path.duration_s > 0.0);

    // A waypoint between the endpoints should still produce a route, and
    // never a shorter one than the direct path.
    let waypoint = GeoPoint::new(43.7381, 7.4246);
    let via = client
        .path(start, end, &[waypoint])
        .expect("route through waypoint");
    assert!(via.distance_m + 1.0 >= path.distance_m * 0.9);

    drop(container);
}

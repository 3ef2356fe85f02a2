//! Sampling a lap at an arbitrary fraction of its distance.

use model::TelemetryPoint;

/// Returns the sample at `progress` from points sorted by `lap_progress`.
///
/// An exact progress match is returned as-is. Between two samples every
/// numeric channel is blended linearly (gear rounded to the nearest
/// integer); channels missing on either side keep the earlier sample's
/// value. Outside the covered range the nearest end sample is returned,
/// and an empty lap yields `None`.
pub fn interpolate_at_progress(points: &[TelemetryPoint], progress: f64) -> Option<TelemetryPoint> {
    let upto = points.partition_point(|p| p.lap_progress <= progress);
    let before = upto.checked_sub(1).map(|i| &points[i]);
    let after = points.get(points.partition_point(|p| p.lap_progress < progress));

    match (before, after) {
        (Some(b), _) if b.lap_progress == progress => Some(b.clone()),
        (Some(b), Some(a)) if a.lap_progress != b.lap_progress => {
            let ratio = (progress - b.lap_progress) / (a.lap_progress - b.lap_progress);
            Some(blend(b, a, ratio, progress))
        }
        (b, a) => b.or(a).cloned(),
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_opt(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        _ => a,
    }
}

fn blend(b: &TelemetryPoint, a: &TelemetryPoint, t: f64, progress: f64) -> TelemetryPoint {
    let gear = match (b.gear, a.gear) {
        (Some(g0), Some(g1)) => Some(lerp(g0 as f64, g1 as f64, t).round() as i8),
        _ => b.gear,
    };
    let timestamp_ms = match (b.timestamp_ms, a.timestamp_ms) {
        (Some(t0), Some(t1)) => Some(lerp(t0 as f64, t1 as f64, t).round() as i64),
        _ => b.timestamp_ms,
    };
    TelemetryPoint {
        id: b.id,
        index: b.index,
        x: lerp_opt(b.x, a.x, t),
        y: lerp_opt(b.y, a.y, t),
        z: lerp_opt(b.z, a.z, t),
        speed: lerp(b.speed, a.speed, t),
        throttle: lerp_opt(b.throttle, a.throttle, t),
        brake: lerp_opt(b.brake, a.brake, t),
        steering: lerp_opt(b.steering, a.steering, t),
        gear,
        rpm: lerp_opt(b.rpm, a.rpm, t),
        lap_progress: progress,
        track_edge: lerp_opt(b.track_edge, a.track_edge, t),
        session_elapsed: lerp(b.session_elapsed, a.session_elapsed, t),
        timestamp_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample(progress: f64, elapsed: f64, speed: f64, gear: i8) -> TelemetryPoint {
        let mut p = TelemetryPoint::new((progress * 100.0) as u32, progress, elapsed);
        p.speed = speed;
        p.gear = Some(gear);
        p.throttle = Some(progress);
        p.brake = Some(1.0 - progress);
        p.rpm = Some(4000.0 + speed * 10.0);
        p
    }

    fn lap() -> Vec<TelemetryPoint> {
        vec![
            sample(0.0, 0.0, 100.0, 2),
            sample(0.25, 20.0, 180.0, 4),
            sample(0.5, 42.0, 120.0, 3),
            sample(1.0, 90.0, 200.0, 6),
        ]
    }

    #[test]
    fn exact_match_returned_unblended() {
        let pts = lap();
        let got = interpolate_at_progress(&pts, 0.5).unwrap();
        assert_eq!(got, pts[2]);
    }

    #[test]
    fn midway_blends_linearly() {
        let pts = lap();
        let got = interpolate_at_progress(&pts, 0.375).unwrap();
        assert_abs_diff_eq!(got.session_elapsed, 31.0);
        assert_abs_diff_eq!(got.speed, 150.0);
        assert_abs_diff_eq!(got.rpm.unwrap(), 5500.0);
        assert_eq!(got.gear, Some(4)); // 3.5 rounds away from zero
        assert_eq!(got.lap_progress, 0.375);
        assert_eq!(got.id, pts[1].id);
    }

    #[test]
    fn blended_fields_stay_between_neighbours() {
        let pts = lap();
        for k in 1..100 {
            let target = 0.5 + 0.5 * k as f64 / 100.0;
            let got = interpolate_at_progress(&pts, target).unwrap();
            let (b, a) = (&pts[2], &pts[3]);
            let within = |v: f64, x: f64, y: f64| v >= x.min(y) - 1e-12 && v <= x.max(y) + 1e-12;
            assert!(within(got.session_elapsed, b.session_elapsed, a.session_elapsed));
            assert!(within(got.speed, b.speed, a.speed));
            assert!(within(got.throttle.unwrap(), b.throttle.unwrap(), a.throttle.unwrap()));
            assert!(within(got.brake.unwrap(), b.brake.unwrap(), a.brake.unwrap()));
            assert!(within(got.rpm.unwrap(), b.rpm.unwrap(), a.rpm.unwrap()));
            assert!(within(got.gear.unwrap() as f64, 3.0, 6.0));
        }
    }

    #[test]
    fn out_of_range_returns_nearest_end() {
        let pts = vec![sample(0.1, 5.0, 100.0, 2), sample(0.9, 70.0, 150.0, 5)];
        assert_eq!(interpolate_at_progress(&pts, 0.0).unwrap(), pts[0]);
        assert_eq!(interpolate_at_progress(&pts, 1.0).unwrap(), pts[1]);
    }

    #[test]
    fn empty_lap_yields_none() {
        assert!(interpolate_at_progress(&[], 0.3).is_none());
    }

    #[test]
    fn missing_channel_keeps_earlier_value() {
        let mut pts = lap();
        pts[2].rpm = None;
        let got = interpolate_at_progress(&pts, 0.4).unwrap();
        assert_eq!(got.rpm, pts[1].rpm);
    }

    #[test]
    fn repeated_progress_picks_last_sample_at_or_before() {
        let mut pts = lap();
        pts.insert(2, sample(0.25, 21.0, 181.0, 4));
        let got = interpolate_at_progress(&pts, 0.25).unwrap();
        assert_eq!(got.session_elapsed, 21.0);
    }
}

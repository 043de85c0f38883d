use bar_resampler::bucket::is_aligned;
use bar_resampler::models::{bar::Bar, bar_series::BarSeries};
use bar_resampler::resample::{max_bars_per_bucket, resample};
use bar_resampler::timeframe::Timeframe;
use bar_resampler::verify::{VerificationResult, verify};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

/// One generated hourly step: gap since the previous bar plus raw prices.
type Step = (i64, f64, f64, f64, f64, f64);

fn step() -> impl Strategy<Value = Step> {
    (
        1i64..=3,
        1.0f64..2_000.0,
        1.0f64..2_000.0,
        0.0f64..50.0,
        0.0f64..50.0,
        0.0f64..1_000_000.0,
    )
}

fn hourly_series(start_hour: i64, steps: &[Step]) -> BarSeries {
    let base = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap() + Duration::hours(start_hour);
    let mut ts = base;
    let bars = steps
        .iter()
        .map(|&(gap, open, close, up, down, volume)| {
            ts += Duration::hours(gap);
            Bar::new(
                ts,
                open,
                open.max(close) + up,
                open.min(close) - down,
                close,
                volume,
            )
        })
        .collect();
    BarSeries::new("PROP", "1h".parse().unwrap(), bars).unwrap()
}

fn bucket() -> impl Strategy<Value = Timeframe> {
    prop_oneof![Just("2h"), Just("4h"), Just("1D")].prop_map(|s| s.parse().unwrap())
}

fn bits(bar: &Bar) -> (i64, [u64; 5]) {
    (
        bar.ts.timestamp(),
        [
            bar.open.to_bits(),
            bar.high.to_bits(),
            bar.low.to_bits(),
            bar.close.to_bits(),
            bar.volume.to_bits(),
        ],
    )
}

fn contributing<'a>(source: &'a BarSeries, bucket_bar: &Bar, bucket: Timeframe) -> Vec<&'a Bar> {
    let end = bucket_bar.ts + bucket.duration();
    source
        .bars()
        .iter()
        .filter(|b| b.ts >= bucket_bar.ts && b.ts < end)
        .collect()
}

proptest! {
    #[test]
    fn buckets_start_on_epoch_aligned_boundaries(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let out = resample(&hourly_series(start, &steps), bucket).unwrap();
        for bar in out.bars() {
            prop_assert!(is_aligned(bar.ts, bucket));
            prop_assert_eq!(bar.ts.timestamp().rem_euclid(bucket.seconds()), 0);
        }
    }

    #[test]
    fn resampling_is_bit_deterministic(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let source = hourly_series(start, &steps);
        let a: Vec<_> = resample(&source, bucket).unwrap().bars().iter().map(bits).collect();
        let b: Vec<_> = resample(&source, bucket).unwrap().bars().iter().map(bits).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn aggregated_bars_keep_ohlc_shape(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let out = resample(&hourly_series(start, &steps), bucket).unwrap();
        for bar in out.bars() {
            prop_assert!(bar.high >= bar.open.max(bar.close).max(bar.low));
            prop_assert!(bar.low <= bar.open.min(bar.close).min(bar.high));
        }
    }

    #[test]
    fn volume_is_conserved_per_bucket(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let source = hourly_series(start, &steps);
        let out = resample(&source, bucket).unwrap();
        for bar in out.bars() {
            let members = contributing(&source, bar, bucket);
            let mut expected = members[0].volume;
            for m in &members[1..] {
                expected += m.volume;
            }
            prop_assert_eq!(bar.volume.to_bits(), expected.to_bits());
        }
        let total_in: usize = out.bars().iter().map(|b| contributing(&source, b, bucket).len()).sum();
        prop_assert_eq!(total_in, source.len());
    }

    #[test]
    fn every_bucket_holds_between_one_and_ratio_bars(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let source = hourly_series(start, &steps);
        let max = max_bars_per_bucket(source.timeframe(), bucket).unwrap() as usize;
        let out = resample(&source, bucket).unwrap();
        for bar in out.bars() {
            let n = contributing(&source, bar, bucket).len();
            prop_assert!((1..=max).contains(&n), "bucket {} holds {} bars", bar.ts, n);
        }
    }

    #[test]
    fn verifier_accepts_resampler_output(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        bucket in bucket(),
    ) {
        let source = hourly_series(start, &steps);
        let out = resample(&source, bucket).unwrap();
        prop_assert_eq!(verify(&source, &out), VerificationResult::Pass);
    }

    #[test]
    fn verifier_rejects_lowered_high(
        start in 0i64..50_000,
        steps in prop::collection::vec(step(), 1..200),
        pick in any::<prop::sample::Index>(),
    ) {
        let source = hourly_series(start, &steps);
        let out = resample(&source, "2h".parse().unwrap()).unwrap();
        let mut bars = out.bars().to_vec();
        let i = pick.index(bars.len());
        bars[i].high = bars[i].close - 1.0;
        let corrupted = BarSeries::new(out.symbol(), out.timeframe(), bars).unwrap();
        let result = verify(&source, &corrupted);
        prop_assert!(!result.is_pass());
        let flagged = result
            .findings()
            .iter()
            .any(|f| matches!(f, bar_resampler::verify::Finding::HighBelowOhlc { .. }));
        prop_assert!(flagged);
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use unshape_kinetics::{Projection, Vec3, overlap};

fuzz_target!(|ends: [f32; 4]| {
    if ends.iter().any(|v| !v.is_finite()) {
        return;
    }

    let mut a = Projection::new(Vec3::X);
    let mut b = Projection::new(Vec3::X);
    a.project_point(Vec3::X * ends[0]);
    a.project_point(Vec3::X * ends[1]);
    b.project_point(Vec3::X * ends[2]);
    b.project_point(Vec3::X * ends[3]);

    // Well-formed intervals must never panic and must classify symmetrically.
    let ab = overlap(&a, &b);
    let ba = overlap(&b, &a);
    assert_eq!(ab.is_touching, ba.is_touching);
    assert_eq!(ab.is_overlapping, ba.is_overlapping);
    assert_eq!(ab.is_containing, ba.is_containing);
    assert_eq!(ab.is_exact_match, ba.is_exact_match);
    assert_eq!(ab.push.abs(), ba.push.abs());
});

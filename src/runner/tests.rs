use super::*;
use crate::error::PbcError;
use crate::scf_impl::{MoSolution, RoothaanDriver};
use crate::testing::{model_cell, ModelEngine};
use approx::assert_relative_eq;

/// Records the k-points it was handed and pretends to converge.
#[derive(Default)]
struct RecordingDriver {
    seen: Vec<Vector3<f64>>,
    scheme: Option<DfScheme>,
}

impl ScfDriver for RecordingDriver {
    fn kernel(&mut self, mf: &mut MeanField, _engine: &dyn IntegralEngine) -> Result<f64> {
        self.seen = mf.kpts.clone();
        self.scheme = Some(mf.with_df.scheme());
        mf.e_tot = -1.0;
        mf.converged = false;
        Ok(mf.e_tot)
    }
}

#[test]
fn test_constructor_variants() {
    assert_eq!(RunConfig::hf().method, Method::Hf);
    assert!(RunConfig::hf().kmesh.is_none());
    assert_eq!(RunConfig::dft().method, Method::lda());
    assert_eq!(
        RunConfig::kdft(KMesh::new([2, 2, 2])).kmesh.map(|m| m.nmp),
        Some([2, 2, 2])
    );
    let custom = RunConfig::dft().with_xc("slater,");
    assert_eq!(
        custom.method,
        Method::Dft {
            xc: "slater,".to_string()
        }
    );
    assert_eq!(RunConfig::hf().with_xc("lda").method, Method::Hf);
}

#[test]
fn test_gamma_hf_run() {
    let engine = ModelEngine::default();
    let config = RunConfig::hf().with_df(Some("df"));
    let run = run_mean_field(Arc::new(model_cell()), &config, &engine, &mut RoothaanDriver).unwrap();

    assert!(run.scaled_kpts.is_none());
    assert!(run.mf.is_gamma_point());
    assert!(run.mf.converged);
    assert_eq!(run.mf.with_df.scheme(), DfScheme::Gaussian);
    assert!(matches!(run.mf.solution, Some(MoSolution::Restricted(_))));
}

#[test]
fn test_kpoint_run_hands_folded_absolute_kpts_to_driver() {
    let engine = ModelEngine::default();
    let cell = Arc::new(model_cell());
    let mesh = KMesh::new([2, 1, 1]).with_gamma(true);
    let mut driver = RecordingDriver::default();
    let run = run_mean_field(
        cell.clone(),
        &RunConfig::khf(mesh).with_df(Some("mix_df")),
        &engine,
        &mut driver,
    );
    // the model engine is Gamma-only, so the backend build at k = -0.5 fails
    assert!(matches!(run, Err(PbcError::Unsupported(_))));
    assert!(driver.seen.is_empty());

    let mesh = KMesh::new([1, 1, 1]).with_gamma(true);
    let run = run_mean_field(
        cell.clone(),
        &RunConfig::kdft(mesh),
        &engine,
        &mut driver,
    )
    .unwrap();
    assert_eq!(driver.seen, vec![Vector3::zeros()]);
    assert_eq!(driver.scheme, Some(DfScheme::Fft));
    assert_eq!(run.scaled_kpts, Some(vec![Vector3::zeros()]));
    assert!(!run.mf.converged);
    assert_relative_eq!(run.mf.e_tot, -1.0);
}

#[test]
fn test_scaled_and_absolute_kpoints_agree() {
    let cell = model_cell();
    let mesh = KMesh::new([2, 2, 1]).with_gamma(true);
    let (scaled, abs) = mesh.build(&cell).unwrap();
    let back = cell.get_scaled_kpts(&abs);
    for (s, b) in scaled.iter().zip(&back) {
        assert_relative_eq!(s, b, epsilon = 1e-12);
    }
}

#[test]
fn test_bad_mesh_fails_before_scf() {
    let mut driver = RecordingDriver::default();
    let result = run_mean_field(
        Arc::new(model_cell()),
        &RunConfig::khf(KMesh::new([0, 1, 1])),
        &ModelEngine::default(),
        &mut driver,
    );
    assert!(matches!(result, Err(PbcError::InvalidMesh(_))));
    assert!(driver.seen.is_empty());
}

#[test]
fn test_low_dimensional_cells_fail_before_scf() {
    let engine = ModelEngine::default();
    for dimension in [0, 1, 2] {
        let mut cell = model_cell();
        cell.dimension = dimension;
        let mut driver = RecordingDriver::default();
        let result = run_mean_field(Arc::new(cell), &RunConfig::hf(), &engine, &mut driver);
        assert!(matches!(result, Err(PbcError::Unsupported(_))));
        assert!(driver.scheme.is_none());
    }
}

use pbc_mp::scf_impl::{MeanField, MoSolution, Orbitals};
use pbc_mp::MeanFieldRun;
use tracing::{info, warn};

fn report_levels(label: &str, orbitals: &Orbitals) {
    info!("  {}:", label);
    for (i, (energy, occ)) in orbitals.energy.iter().zip(orbitals.occ.iter()).enumerate() {
        info!("    Level {}: {:.8} au (occ {:.1})", i + 1, energy, occ);
    }
}

pub fn report_mean_field(run: &MeanFieldRun) {
    let mf = &run.mf;
    info!("\nMean-field calculation finished.");

    if let Some(scaled) = &run.scaled_kpts {
        info!("\nk-points (fractional -> absolute, 1/Bohr):");
        for (i, (s, k)) in scaled.iter().zip(&mf.kpts).enumerate() {
            info!(
                "  {:>3}: [{:+.4}, {:+.4}, {:+.4}] -> [{:+.6}, {:+.6}, {:+.6}]",
                i + 1,
                s.x,
                s.y,
                s.z,
                k.x,
                k.y,
                k.z
            );
        }
    }

    match &mf.solution {
        Some(MoSolution::Restricted(orbitals)) => {
            info!("\nFinal Energy Levels:");
            report_levels("Restricted", orbitals);
        }
        Some(MoSolution::Unrestricted { alpha, beta }) => {
            info!("\nFinal Energy Levels:");
            report_levels("Alpha electrons", alpha);
            report_levels("Beta electrons", beta);
        }
        Some(MoSolution::General { orbitals, .. }) => {
            info!("\nFinal Energy Levels:");
            report_levels("Spin orbitals", orbitals);
        }
        None => {}
    }

    if !mf.converged {
        warn!("SCF did not converge; energies below are from the last cycle");
    }
    info!("\nTotal energy: {:.10} au", mf.e_tot);
}

pub fn report_mp2(mf: &MeanField, e_corr: f64) {
    info!("===========================================");
    info!("        MP2 Calculation Summary");
    info!("===========================================");
    info!("Mean-field energy:         {:.12} Eh", mf.e_tot);
    info!("MP2 correlation energy:    {:.12} Eh", e_corr);
    info!("Total MP2 energy:          {:.12} Eh", mf.e_tot + e_corr);
    info!("===========================================");
}

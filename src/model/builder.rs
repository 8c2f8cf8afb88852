//! Variant selection: build the right model once from the configuration.
use tracing::info;

use crate::model::{
    compartments::{FoldDiagnosed, KeepDiagnosed},
    config::BinnConfig,
    denoised_binn::DenoisedBinn,
    errors::BinnResult,
    parameters::ModelParameters,
    surface_binn::SurfaceBinn,
    table::PrecomputedDerivativeTable,
    traits::DifferentialModel,
};

/// Learned-surface model; `config.keep_d` selects 9 or 8 compartments.
///
/// # Errors
/// Any parameter, configuration or network construction error.
pub fn build_model(
    params: ModelParameters, config: &BinnConfig,
) -> BinnResult<Box<dyn DifferentialModel>> {
    params.validate()?;
    let model: Box<dyn DifferentialModel> = if config.keep_d {
        Box::new(SurfaceBinn::<KeepDiagnosed>::from_config(params, config)?)
    } else {
        Box::new(SurfaceBinn::<FoldDiagnosed>::from_config(params, config)?)
    };
    info!(
        variant = model.variant_name(),
        parameters = model.num_parameters(),
        policy = config.policy.identifier(),
        "built surface model"
    );
    Ok(model)
}

/// Rate-only model over a denoised table; `config.keep_d` selects the variant.
pub fn build_denoised_model(
    params: ModelParameters, config: &BinnConfig, table: PrecomputedDerivativeTable,
) -> BinnResult<Box<dyn DifferentialModel>> {
    params.validate()?;
    let model: Box<dyn DifferentialModel> = if config.keep_d {
        Box::new(DenoisedBinn::<KeepDiagnosed>::from_config(params, config, table)?)
    } else {
        Box::new(DenoisedBinn::<FoldDiagnosed>::from_config(params, config, table)?)
    };
    info!(
        variant = model.variant_name(),
        parameters = model.num_parameters(),
        "built denoised model"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{config::NetworkArchitecture, parameters::tests::scenario};
    use crate::network::activations::Activation;

    #[test]
    // Purpose
    // -------
    // `keep_d` selects the structural variant once.
    //
    // Given
    // -----
    // The same small configuration with keep_d = true and false.
    //
    // Expect
    // ------
    // 9 and 8 compartments with distinct variant names.
    fn keep_d_selects_variant() {
        let base = BinnConfig::new(180.0).with_architecture(NetworkArchitecture {
            surface_hidden: vec![4],
            rate_hidden: vec![4],
            activation: Activation::Relu,
        });
        let keep = build_model(scenario(), &base.clone().with_keep_d(true)).unwrap();
        let fold = build_model(scenario(), &base.with_keep_d(false)).unwrap();

        assert_eq!(keep.n_compartments(), 9);
        assert_eq!(fold.n_compartments(), 8);
        assert_ne!(keep.variant_name(), fold.variant_name());
    }
}

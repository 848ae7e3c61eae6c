use burn::prelude::*;
use burn::{
    module::AutodiffModule,
    optim::{
        self, Optimizer, SimpleOptimizer, adaptor::OptimizerAdaptor, momentum::MomentumConfig,
    },
    tensor::backend::AutodiffBackend,
};

pub trait OptimConfigExt<AutoB, AutoM>
where
    Self: Config,
    AutoB: AutodiffBackend,
    AutoM: AutodiffModule<AutoB>,
{
    type Optim: SimpleOptimizer<AutoB::InnerBackend>;
    type Adaptor: Optimizer<AutoM, AutoB>;
    fn init(&self) -> Self::Adaptor;
}

impl<AutoB, AutoM> OptimConfigExt<AutoB, AutoM> for optim::SgdConfig
where
    Self: Config,
    AutoB: AutodiffBackend,
    AutoM: AutodiffModule<AutoB>,
{
    type Optim = optim::Sgd<AutoB::InnerBackend>;
    type Adaptor = OptimizerAdaptor<Self::Optim, AutoM, AutoB>;
    fn init(&self) -> Self::Adaptor {
        optim::SgdConfig::init::<AutoB, AutoM>(self)
    }
}

/// Plain stochastic gradient descent, optionally with (undampened) momentum.
pub fn sgd_config(momentum: Option<f64>) -> optim::SgdConfig {
    optim::SgdConfig::new().with_momentum(momentum.map(|momentum| {
        MomentumConfig::new()
            .with_momentum(momentum)
            .with_dampening(0.0)
    }))
}

//! AWS Fault Injection Simulator backend
//!
//! Each signal is sent by creating an experiment template that targets every
//! instance in one batched call, then starting an experiment from it. The
//! template and the experiment together are the simulation; cleanup stops the
//! experiment (best effort, it is usually already finished) and deletes the
//! template.
//!
//! Experiments run under an IAM role that must already exist in the caller's
//! account; the default name matches the role the companion tooling
//! provisions, and [`FisSimulation::with_role_arn`] overrides it.

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_fis::types::{
    CreateExperimentTemplateActionInput, CreateExperimentTemplateStopConditionInput,
    CreateExperimentTemplateTargetInput,
};
use aws_types::region::Region;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{InterrupterError, Result};
use crate::simulation::{Signal, SimulationHandle, SpotSimulation};

/// FIS resource type for spot instance targets
const SPOT_INSTANCE_RESOURCE_TYPE: &str = "aws:ec2:spot-instance";

/// Name of the target entry shared by both experiment actions
const TARGET_NAME: &str = "Instances";

/// The interruption action wants a notification lead time; the
/// operator-visible delay is enforced by the caller before the call is
/// issued, so the notification is due immediately
const NO_LEAD_TIME: &str = "PT0S";

/// IAM role the experiments run under, expected to exist in the caller's
/// account
const DEFAULT_ROLE_NAME: &str = "aws-fis-itn";

/// Value of the ManagedBy tag put on every experiment template
const MANAGED_BY: &str = "ec2-spot-interrupter";

/// Region/profile hints for credential resolution
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// AWS region override; falls back to the default provider chain
    pub region: Option<String>,
    /// Shared-config profile override
    pub profile: Option<String>,
}

/// AWS FIS implementation of [`SpotSimulation`]
pub struct FisSimulation {
    client: aws_sdk_fis::Client,
    region: String,
    account_id: String,
    role_arn: String,
}

impl FisSimulation {
    /// Resolve credentials and construct the FIS client
    ///
    /// Region and profile follow the standard provider chain with the given
    /// overrides taking precedence. Fails with a configuration error, before
    /// any fault API call, if no region resolves or the credentials do not
    /// authenticate. The caller identity probe also yields the account ID
    /// needed to build instance and role ARNs.
    pub async fn connect(options: &ConnectOptions) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &options.region {
            let chain = RegionProviderChain::first_try(Region::new(region.clone()))
                .or_default_provider();
            loader = loader.region(chain);
        }
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        let region = match config.region() {
            Some(region) => region.as_ref().to_string(),
            None => {
                return Err(InterrupterError::configuration(
                    "no AWS region configured; pass --region or set AWS_REGION",
                ));
            }
        };

        let identity = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                InterrupterError::configuration(format!(
                    "failed to authenticate with AWS: {}",
                    aws_sdk_sts::Error::from(e)
                ))
            })?;
        let account_id = identity.account().ok_or_else(|| {
            InterrupterError::configuration("caller identity did not include an account ID")
        })?;

        debug!(region = %region, account_id = %account_id, "connected to AWS");

        Ok(Self {
            client: aws_sdk_fis::Client::new(&config),
            role_arn: default_role_arn(account_id),
            account_id: account_id.to_string(),
            region,
        })
    }

    /// Override the IAM role the experiments run under
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = role_arn.into();
        self
    }

    /// Create and start one experiment emitting `signal` to all targets
    async fn start_simulation(
        &self,
        signal: Signal,
        targets: &[String],
    ) -> Result<SimulationHandle> {
        let step = send_step(signal);

        let mut target = CreateExperimentTemplateTargetInput::builder()
            .resource_type(SPOT_INSTANCE_RESOURCE_TYPE)
            .selection_mode("ALL");
        for instance_id in targets {
            target = target.resource_arns(instance_arn(&self.region, &self.account_id, instance_id));
        }
        let target = target
            .build()
            .map_err(|e| InterrupterError::operation(step, e))?;

        let mut action = CreateExperimentTemplateActionInput::builder()
            .action_id(action_id(signal))
            .description(signal.as_str())
            .targets("SpotInstances", TARGET_NAME);
        if signal == Signal::Interruption {
            action = action.parameters("durationBeforeInterruption", NO_LEAD_TIME);
        }
        let action = action
            .build()
            .map_err(|e| InterrupterError::operation(step, e))?;

        let stop_condition = CreateExperimentTemplateStopConditionInput::builder()
            .source("none")
            .build()
            .map_err(|e| InterrupterError::operation(step, e))?;

        let created = self
            .client
            .create_experiment_template()
            .client_token(Uuid::new_v4().to_string())
            .description(format!(
                "{} for {} instance(s)",
                signal.as_str(),
                targets.len()
            ))
            .role_arn(&self.role_arn)
            .targets(TARGET_NAME, target)
            .actions(action_key(signal), action)
            .stop_conditions(stop_condition)
            .tags("ManagedBy", MANAGED_BY)
            .send()
            .await
            .map_err(|e| InterrupterError::operation(step, aws_sdk_fis::Error::from(e)))?;

        let template_id = created
            .experiment_template()
            .and_then(|t| t.id())
            .ok_or_else(|| {
                InterrupterError::operation(step, "created experiment template has no ID")
            })?
            .to_string();

        debug!(template_id = %template_id, signal = signal.as_str(), "experiment template created");

        let started = self
            .client
            .start_experiment()
            .client_token(Uuid::new_v4().to_string())
            .experiment_template_id(&template_id)
            .send()
            .await;

        let started = match started {
            Ok(output) => output,
            Err(e) => {
                // The template exists but nothing is running; remove it so
                // the caller only ever has to clean up handles it was given.
                if let Err(delete_err) = self
                    .client
                    .delete_experiment_template()
                    .id(&template_id)
                    .send()
                    .await
                {
                    warn!(
                        template_id = %template_id,
                        error = %aws_sdk_fis::Error::from(delete_err),
                        "failed to delete experiment template after start failure"
                    );
                }
                return Err(InterrupterError::operation(
                    step,
                    aws_sdk_fis::Error::from(e),
                ));
            }
        };

        let experiment_id = started
            .experiment()
            .and_then(|e| e.id())
            .ok_or_else(|| InterrupterError::operation(step, "started experiment has no ID"))?
            .to_string();

        debug!(experiment_id = %experiment_id, signal = signal.as_str(), "experiment started");

        Ok(SimulationHandle {
            signal,
            template_id,
            experiment_id,
        })
    }
}

impl SpotSimulation for FisSimulation {
    async fn send_rebalance_recommendations(&self, targets: &[String]) -> Result<SimulationHandle> {
        self.start_simulation(Signal::Rebalance, targets).await
    }

    async fn send_interruption_notifications(
        &self,
        targets: &[String],
    ) -> Result<SimulationHandle> {
        self.start_simulation(Signal::Interruption, targets).await
    }

    async fn remove_simulation(&self, handle: &SimulationHandle) -> Result<()> {
        // Usually the experiment has already finished by the time cleanup
        // runs, and stopping a finished experiment is an error on the FIS
        // side; the template delete below is the cleanup that matters.
        if let Err(e) = self
            .client
            .stop_experiment()
            .id(&handle.experiment_id)
            .send()
            .await
        {
            debug!(
                experiment_id = %handle.experiment_id,
                error = %aws_sdk_fis::Error::from(e),
                "stop experiment skipped"
            );
        }

        self.client
            .delete_experiment_template()
            .id(&handle.template_id)
            .send()
            .await
            .map_err(|e| {
                InterrupterError::operation("clean up simulations", aws_sdk_fis::Error::from(e))
            })?;

        debug!(
            template_id = %handle.template_id,
            signal = handle.signal.as_str(),
            "simulation removed"
        );

        Ok(())
    }
}

/// FIS action emitting the given signal
fn action_id(signal: Signal) -> &'static str {
    match signal {
        Signal::Rebalance => "aws:ec2:send-spot-rebalance-recommendations",
        Signal::Interruption => "aws:ec2:send-spot-instance-interruptions",
    }
}

/// Name of the single action inside each experiment template
fn action_key(signal: Signal) -> &'static str {
    match signal {
        Signal::Rebalance => "rebalance",
        Signal::Interruption => "interrupt",
    }
}

/// Step name carried by errors from the send path
fn send_step(signal: Signal) -> &'static str {
    match signal {
        Signal::Rebalance => "send spot rebalance recommendations",
        Signal::Interruption => "send spot interruption notifications",
    }
}

fn instance_arn(region: &str, account_id: &str, instance_id: &str) -> String {
    format!("arn:aws:ec2:{region}:{account_id}:instance/{instance_id}")
}

fn default_role_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{DEFAULT_ROLE_NAME}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_arn() {
        assert_eq!(
            instance_arn("us-east-1", "123456789012", "i-0abc123"),
            "arn:aws:ec2:us-east-1:123456789012:instance/i-0abc123"
        );
    }

    #[test]
    fn test_default_role_arn() {
        assert_eq!(
            default_role_arn("123456789012"),
            "arn:aws:iam::123456789012:role/aws-fis-itn"
        );
    }

    #[test]
    fn test_action_ids_differ_per_signal() {
        assert_eq!(
            action_id(Signal::Interruption),
            "aws:ec2:send-spot-instance-interruptions"
        );
        assert_ne!(action_id(Signal::Rebalance), action_id(Signal::Interruption));
    }
}

//! Profile command handlers.

use anyhow::Result;
use coursehub_core::api::{Profile, ProfileUpdate};
use coursehub_core::client::ApiClient;

use super::{api_error, require_session};

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    mobile_no: Option<String>,
}

impl From<UpdateArgs> for ProfileUpdate {
    fn from(args: UpdateArgs) -> Self {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string());
        ProfileUpdate {
            first_name: trimmed(args.first_name),
            last_name: trimmed(args.last_name),
            email: trimmed(args.email),
            mobile_no: trimmed(args.mobile_no),
        }
    }
}

fn print_profile(profile: &Profile) {
    println!("Username:   {}", profile.username);
    println!("Email:      {}", profile.email);
    println!("First name: {}", profile.first_name);
    println!("Last name:  {}", profile.last_name);
    if let Some(role) = &profile.role {
        println!("Role:       {role}");
    }
    if let Some(mobile) = &profile.mobile_no {
        println!("Mobile:     {mobile}");
    }
}

pub async fn show(client: &ApiClient) -> Result<()> {
    require_session(client)?;
    let profile = client.profile().await.map_err(api_error)?;
    print_profile(&profile);
    Ok(())
}

pub async fn update(client: &ApiClient, args: UpdateArgs) -> Result<()> {
    require_session(client)?;
    let profile = client
        .update_profile(&args.into())
        .await
        .map_err(api_error)?;
    println!("✓ Profile updated");
    print_profile(&profile);
    Ok(())
}

// Copyright 2025 Terraforge Contributors
// SPDX-License-Identifier: Apache-2.0

//! The fixed (platform, type) → template registry. 18 entries, 9 per
//! platform, covering compute, network primitives, load balancers,
//! storage and managed databases.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::Platform;

const AWS_EC2: &str = r#"resource "aws_instance" "{{safe_id}}" {
  ami           = "{{ami}}"
  instance_type = "{{instance_type}}"
{{#if region}}
  availability_zone = "{{region}}"
{{/if}}
{{tags_hcl}}
}
"#;

const AWS_SECURITY_GROUP: &str = r#"resource "aws_security_group" "{{safe_id}}" {
  name        = "{{name}}"
  description = "{{description}}"
{{#each ingress_rules}}
  ingress {
    from_port   = {{this.from_port}}
    to_port     = {{this.to_port}}
    protocol    = "tcp"
    cidr_blocks = {{this.cidr_blocks}}
  }
{{/each}}
{{#each egress_rules}}
  egress {
    from_port   = {{this.from_port}}
    to_port     = {{this.to_port}}
    protocol    = "-1"
    cidr_blocks = {{this.cidr_blocks}}
  }
{{/each}}
{{tags_hcl}}
}
"#;

const AWS_S3_BUCKET: &str = r#"resource "aws_s3_bucket" "{{safe_id}}" {
  bucket = "{{bucket_name}}"
{{tags_hcl}}
}

resource "aws_s3_bucket_public_access_block" "{{safe_id}}" {
  bucket                  = aws_s3_bucket.{{safe_id}}.id
  block_public_acls       = {{block_public_access}}
  block_public_policy     = {{block_public_access}}
  ignore_public_acls      = {{block_public_access}}
  restrict_public_buckets = {{block_public_access}}
}
"#;

const AWS_RDS: &str = r#"resource "aws_db_instance" "{{safe_id}}" {
  identifier        = "{{safe_id}}"
  engine            = "{{engine}}"
  instance_class    = "{{instance_class}}"
  storage_encrypted = {{encrypted}}
{{tags_hcl}}
}
"#;

const AWS_LB: &str = r#"resource "aws_lb" "{{safe_id}}" {
  name               = "{{safe_id}}"
  load_balancer_type = "{{lb_type}}"
{{#each subnets}}
  subnets = {{this}}
{{/each}}
{{tags_hcl}}
}
"#;

const AWS_VPC: &str = r#"resource "aws_vpc" "{{safe_id}}" {
  cidr_block = "{{cidr_block}}"
{{tags_hcl}}
}
"#;

const AWS_SUBNET: &str = r#"resource "aws_subnet" "{{safe_id}}" {
  cidr_block        = "{{cidr_block}}"
  availability_zone = "{{availability_zone}}"
{{tags_hcl}}
}
"#;

const AWS_INTERNET_GATEWAY: &str = r#"resource "aws_internet_gateway" "{{safe_id}}" {
{{tags_hcl}}
}
"#;

const AWS_ROUTE_TABLE: &str = r#"resource "aws_route_table" "{{safe_id}}" {
{{tags_hcl}}
}
"#;

const AZURE_VM: &str = r#"{{#if is_windows}}
resource "azurerm_windows_virtual_machine" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
  size                = "{{size}}"
  admin_username      = "{{admin_username}}"
  admin_password      = var.{{safe_id}}_admin_password
{{tags_hcl}}
}
{{/if}}
{{#unless is_windows}}
resource "azurerm_linux_virtual_machine" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
  size                = "{{size}}"
  admin_username      = "{{admin_username}}"

  admin_ssh_key {
    username   = "{{admin_username}}"
    public_key = var.{{safe_id}}_ssh_public_key
  }
{{tags_hcl}}
}
{{/unless}}
"#;

const AZURE_STORAGE_ACCOUNT: &str = r#"resource "azurerm_storage_account" "{{safe_id}}" {
  name                     = "{{safe_id}}"
  location                 = "{{location}}"
  resource_group_name      = {{resource_group|azure_rg_ref}}
  account_tier             = "{{account_tier}}"
  min_tls_version          = "{{min_tls_version}}"
  enable_https_traffic_only = {{https_only}}
{{tags_hcl}}
}
"#;

const AZURE_VNET: &str = r#"resource "azurerm_virtual_network" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
  address_space       = {{address_space}}
{{tags_hcl}}
}
"#;

const AZURE_SUBNET: &str = r#"resource "azurerm_subnet" "{{safe_id}}" {
  name                 = "{{name}}"
  resource_group_name  = {{resource_group|azure_rg_ref}}
  address_prefixes     = [{{address_prefix}}]
}
"#;

const AZURE_NSG: &str = r#"resource "azurerm_network_security_group" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
{{tags_hcl}}
}
"#;

const AZURE_LB: &str = r#"resource "azurerm_lb" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
  sku                 = "{{sku}}"
{{tags_hcl}}
}
"#;

const AZURE_SQL_DATABASE: &str = r#"resource "azurerm_mssql_database" "{{safe_id}}" {
  name        = "{{name}}"
  server_id   = data.azurerm_mssql_server.{{server_name|safe_id}}.id
  location    = "{{location}}"
{{tags_hcl}}
}
"#;

const AZURE_RESOURCE_GROUP: &str = r#"resource "azurerm_resource_group" "{{safe_id}}" {
  name     = "{{name}}"
  location = "{{location}}"
{{tags_hcl}}
}
"#;

const AZURE_PUBLIC_IP: &str = r#"resource "azurerm_public_ip" "{{safe_id}}" {
  name                = "{{name}}"
  location            = "{{location}}"
  resource_group_name = {{resource_group|azure_rg_ref}}
  allocation_method   = "Static"
{{tags_hcl}}
}
"#;

static REGISTRY: Lazy<HashMap<(Platform, &'static str), &'static str>> = Lazy::new(|| {
    HashMap::from([
        ((Platform::Aws, "aws_ec2"), AWS_EC2),
        ((Platform::Aws, "aws_security_group"), AWS_SECURITY_GROUP),
        ((Platform::Aws, "aws_s3_bucket"), AWS_S3_BUCKET),
        ((Platform::Aws, "aws_rds"), AWS_RDS),
        ((Platform::Aws, "aws_lb"), AWS_LB),
        ((Platform::Aws, "aws_vpc"), AWS_VPC),
        ((Platform::Aws, "aws_subnet"), AWS_SUBNET),
        ((Platform::Aws, "aws_internet_gateway"), AWS_INTERNET_GATEWAY),
        ((Platform::Aws, "aws_route_table"), AWS_ROUTE_TABLE),
        ((Platform::Azure, "azure_vm"), AZURE_VM),
        ((Platform::Azure, "azure_storage_account"), AZURE_STORAGE_ACCOUNT),
        ((Platform::Azure, "azure_vnet"), AZURE_VNET),
        ((Platform::Azure, "azure_subnet"), AZURE_SUBNET),
        ((Platform::Azure, "azure_nsg"), AZURE_NSG),
        ((Platform::Azure, "azure_lb"), AZURE_LB),
        ((Platform::Azure, "azure_sql_database"), AZURE_SQL_DATABASE),
        ((Platform::Azure, "azure_resource_group"), AZURE_RESOURCE_GROUP),
        ((Platform::Azure, "azure_public_ip"), AZURE_PUBLIC_IP),
    ])
});

pub struct TemplateRegistry;

impl TemplateRegistry {
    pub fn get(&self, platform: Platform, type_: &str) -> Option<&'static str> {
        REGISTRY.get(&(platform, type_)).copied()
    }

    /// `<platform>/<type>` keys for every registered template, sorted, for
    /// surfacing in `TemplateError::missing`.
    pub fn available_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = REGISTRY
            .keys()
            .map(|(platform, type_)| format!("{platform}/{type_}"))
            .collect();
        keys.sort();
        keys
    }
}

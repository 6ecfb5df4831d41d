//! Project descriptor rendering.
//!
//! The descriptor is the build-system file for the generated project. Its
//! format is a capability ([`DescriptorFormat`]) rather than part of
//! [`Project`](crate::Project), so targets can swap it out.

use std::fmt::Debug;

use crate::project::ProjectSettings;
use crate::writer::ContentType;

/// Renders the project descriptor for one target.
pub trait DescriptorFormat: Debug + Send + Sync {
    /// Output path of the descriptor.
    fn path(&self, settings: &ProjectSettings) -> String;

    fn content_type(&self) -> ContentType;

    fn render(&self, settings: &ProjectSettings) -> String;
}

/// MSBuild SDK-style project targeting `netstandard2.0`.
///
/// The release block adds strong-signing settings only for Azure modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsprojDescriptor;

impl DescriptorFormat for CsprojDescriptor {
    fn path(&self, settings: &ProjectSettings) -> String {
        settings.files.csproj.clone()
    }

    fn content_type(&self) -> ContentType {
        ContentType::SourceFileCsharp
    }

    fn render(&self, settings: &ProjectSettings) -> String {
        let release = if settings.azure {
            "    <SignAssembly>true</SignAssembly>
    <DelaySign>true</DelaySign>
    <AssemblyOriginatorKeyFile>MSSharedLibKey.snk</AssemblyOriginatorKeyFile>
    <DefineConstants>TRACE;RELEASE;NETSTANDARD;SIGN</DefineConstants>"
        } else {
            "    <DefineConstants>TRACE;RELEASE;NETSTANDARD</DefineConstants>"
        };
        let resources = settings
            .folders
            .resources
            .strip_prefix("./")
            .unwrap_or(&settings.folders.resources);

        format!(
            r#"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <Version>{version}</Version>
    <LangVersion>7.1</LangVersion>
    <TargetFramework>netstandard2.0</TargetFramework>
    <OutputType>Library</OutputType>
    <AssemblyName>{assembly}</AssemblyName>
    <RootNamespace>{namespace}</RootNamespace>
    <CopyLocalLockFileAssemblies>true</CopyLocalLockFileAssemblies>
    <AppendTargetFrameworkToOutputPath>false</AppendTargetFrameworkToOutputPath>
    <OutputPath>{bin}</OutputPath>
    <PublishDir>$(OutputPath)</PublishDir>
    <NuspecFile>{module}.nuspec</NuspecFile>
    <NoPackageAnalysis>true</NoPackageAnalysis>
    <!-- Some methods are marked async and don't have an await in them -->
    <NoWarn>1998</NoWarn>
    <TreatWarningsAsErrors>true</TreatWarningsAsErrors>
    <WarningsAsErrors />
  </PropertyGroup>

  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|AnyCPU'">
    <DelaySign>false</DelaySign>
    <DefineConstants>TRACE;DEBUG;NETSTANDARD</DefineConstants>
  </PropertyGroup>

  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Release|AnyCPU'">
{release}
  </PropertyGroup>

  <ItemGroup>
    <PackageReference Include="PowerShellStandard.Library" Version="5.1.0" />
    <PackageReference Include="Microsoft.CSharp" Version="4.4.1" />
  </ItemGroup>

  <PropertyGroup>
    <DefaultItemExcludes>$(DefaultItemExcludes);{resources}/**</DefaultItemExcludes>
  </PropertyGroup>

</Project>"#,
            version = settings.module_version,
            assembly = settings.assembly_name(),
            namespace = settings.project_namespace,
            bin = settings.folders.bin,
            module = settings.module_name,
        )
    }
}

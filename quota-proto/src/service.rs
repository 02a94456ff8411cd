//! gRPC service plumbing for `quota.v1.QuotaService`.
//!
//! Hand-rolled equivalent of the tonic-generated server module: a service
//! trait, a tower `Service` that routes on the gRPC method path, and one
//! `UnaryService` adapter per RPC.

use super::*;

/// Server module for the quota service.
pub mod quota_service_server {
    use super::*;
    use std::sync::Arc;
    use tonic::codegen::*;

    /// The RPC surface every quota plugin must serve.
    #[async_trait::async_trait]
    pub trait QuotaService: std::marker::Send + std::marker::Sync + 'static {
        async fn get_plugin_info(
            &self,
            request: tonic::Request<PluginInfoRequest>,
        ) -> std::result::Result<tonic::Response<PluginInfoResponse>, tonic::Status>;

        async fn get_plugin_capabilities(
            &self,
            request: tonic::Request<GetPluginCapabilitiesRequest>,
        ) -> std::result::Result<tonic::Response<GetPluginCapabilitiesResponse>, tonic::Status>;

        async fn set_quota(
            &self,
            request: tonic::Request<SetQuotaRequest>,
        ) -> std::result::Result<tonic::Response<SetQuotaResponse>, tonic::Status>;

        async fn get_quota(
            &self,
            request: tonic::Request<GetQuotaRequest>,
        ) -> std::result::Result<tonic::Response<GetQuotaResponse>, tonic::Status>;

        async fn clear_quota(
            &self,
            request: tonic::Request<ClearQuotaRequest>,
        ) -> std::result::Result<tonic::Response<ClearQuotaResponse>, tonic::Status>;

        async fn list_quotas(
            &self,
            request: tonic::Request<ListQuotasRequest>,
        ) -> std::result::Result<tonic::Response<ListQuotasResponse>, tonic::Status>;

        async fn validate_quota_request(
            &self,
            request: tonic::Request<SetQuotaRequest>,
        ) -> std::result::Result<tonic::Response<ValidateQuotaResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct QuotaServiceServer<T: QuotaService> {
        inner: Arc<T>,
    }

    impl<T: QuotaService> QuotaServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self {
                inner: Arc::new(inner),
            }
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T: QuotaService> Clone for QuotaServiceServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }

    impl<T: QuotaService> tonic::server::NamedService for QuotaServiceServer<T> {
        const NAME: &'static str = "quota.v1.QuotaService";
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for QuotaServiceServer<T>
    where
        T: QuotaService,
        B: Body + std::marker::Send + 'static,
        B::Error: Into<StdError> + std::marker::Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();

            match req.uri().path() {
                "/quota.v1.QuotaService/GetPluginInfo" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(GetPluginInfoSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/GetPluginCapabilities" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(GetPluginCapabilitiesSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/SetQuota" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(SetQuotaSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/GetQuota" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(GetQuotaSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/ClearQuota" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(ClearQuotaSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/ListQuotas" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(ListQuotasSvc(inner), req).await;
                    Ok(res)
                }),
                "/quota.v1.QuotaService/ValidateQuotaRequest" => Box::pin(async move {
                    let mut grpc = tonic::server::Grpc::new(tonic::codec::ProstCodec::default());
                    let res = grpc.unary(ValidateQuotaRequestSvc(inner), req).await;
                    Ok(res)
                }),
                _ => Box::pin(async move {
                    let mut builder = http::Response::builder();
                    builder = builder.status(200).header("grpc-status", "12");
                    Ok(builder.body(tonic::body::empty_body()).unwrap())
                }),
            }
        }
    }

    struct GetPluginInfoSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<PluginInfoRequest> for GetPluginInfoSvc<T> {
        type Response = PluginInfoResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<PluginInfoRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.get_plugin_info(request).await })
        }
    }

    struct GetPluginCapabilitiesSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<GetPluginCapabilitiesRequest>
        for GetPluginCapabilitiesSvc<T>
    {
        type Response = GetPluginCapabilitiesResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<GetPluginCapabilitiesRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.get_plugin_capabilities(request).await })
        }
    }

    struct SetQuotaSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<SetQuotaRequest> for SetQuotaSvc<T> {
        type Response = SetQuotaResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<SetQuotaRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.set_quota(request).await })
        }
    }

    struct GetQuotaSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<GetQuotaRequest> for GetQuotaSvc<T> {
        type Response = GetQuotaResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<GetQuotaRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.get_quota(request).await })
        }
    }

    struct ClearQuotaSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<ClearQuotaRequest> for ClearQuotaSvc<T> {
        type Response = ClearQuotaResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<ClearQuotaRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.clear_quota(request).await })
        }
    }

    struct ListQuotasSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<ListQuotasRequest> for ListQuotasSvc<T> {
        type Response = ListQuotasResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<ListQuotasRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.list_quotas(request).await })
        }
    }

    struct ValidateQuotaRequestSvc<T: QuotaService>(Arc<T>);

    impl<T: QuotaService> tonic::server::UnaryService<SetQuotaRequest> for ValidateQuotaRequestSvc<T> {
        type Response = ValidateQuotaResponse;
        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;

        fn call(&mut self, request: tonic::Request<SetQuotaRequest>) -> Self::Future {
            let inner = self.0.clone();
            Box::pin(async move { inner.validate_quota_request(request).await })
        }
    }
}
